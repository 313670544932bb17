//! Drives the full router (all interceptors included) against the in-memory store.

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use contacts_app::{create_router, AppState, Config, ContactStore, MemoryContactStore, StoreError};
use std::sync::Arc;
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Minimal cookie-keeping client.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    async fn send(&mut self, mut req: Request<Body>) -> Reply {
        if let Some(cookie) = &self.cookie {
            req.headers_mut().insert(COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        if let Some(set) = headers.get(SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn get(&mut self, uri: &str) -> Reply {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Reply {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let req = Request::post(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }
}

fn csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page has a CSRF field") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn test_state(store: Arc<MemoryContactStore>) -> AppState {
    let config = Config::from_args(["contacts-web", "--db-dsn", "postgres://unused/contacts"]).unwrap();
    AppState::new(store, config)
}

fn test_app() -> (Router, Arc<MemoryContactStore>) {
    let store = Arc::new(MemoryContactStore::new());
    (create_router(test_state(store.clone())), store)
}

async fn seed(store: &MemoryContactStore) -> i32 {
    store
        .insert("Ada", "Lovelace", "123-456-7890", "ada@example.com")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ping_skips_sessions() {
    let (app, _) = test_app();
    let mut browser = Browser::new(app);

    let reply = browser.get("/ping").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "OK");
    assert!(reply.headers.get(SET_COOKIE).is_none());
    assert_eq!(reply.headers.get("x-frame-options").unwrap(), "deny");
    assert_eq!(reply.headers.get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_cookieless_browsing_creates_no_sessions() {
    let store = Arc::new(MemoryContactStore::new());
    let id = seed(&store).await;
    let state = test_state(store);
    let sessions = state.sessions.clone();
    let app = create_router(state);

    let view = format!("/contacts/view/{id}");
    for _ in 0..50 {
        for uri in ["/", "/about", view.as_str()] {
            let reply = Browser::new(app.clone()).get(uri).await;
            assert_eq!(reply.status, StatusCode::OK, "{uri}");
            assert!(reply.headers.get(SET_COOKIE).is_none(), "{uri}");
        }
    }
    assert!(sessions.is_empty().await);

    // A page with a form needs a CSRF token, so it does start a session.
    let reply = Browser::new(app).get("/contacts/create").await;
    assert!(reply.headers.get(SET_COOKIE).is_some());
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn test_static_stylesheet() {
    let (app, _) = test_app();
    let reply = Browser::new(app).get("/static/main.css").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap().starts_with("text/css"));
}

#[tokio::test]
async fn test_home_lists_contacts_alphabetically() {
    let (app, store) = test_app();
    store.insert("Zed", "Shaw", "123-456-7890", "z@example.com").await.unwrap();
    seed(&store).await;

    let reply = Browser::new(app).get("/").await;
    assert_eq!(reply.status, StatusCode::OK);
    let ada = reply.body.find("Ada Lovelace").unwrap();
    let zed = reply.body.find("Zed Shaw").unwrap();
    assert!(ada < zed);
}

#[tokio::test]
async fn test_bad_ids_are_not_found() {
    let (app, store) = test_app();
    seed(&store).await;
    let mut browser = Browser::new(app);

    for uri in [
        "/contacts/view/abc",
        "/contacts/view/0",
        "/contacts/view/-1",
        "/contacts/view/999",
        "/contacts/edit/999",
        "/contacts/delete/abc",
        "/no/such/page",
    ] {
        assert_eq!(browser.get(uri).await.status, StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(browser.get("/contacts/view/1").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_redirects_and_flashes_once() {
    let (app, store) = test_app();
    let mut browser = Browser::new(app);

    let form = browser.get("/contacts/create").await;
    assert_eq!(form.status, StatusCode::OK);
    let token = csrf_token(&form.body);

    let reply = browser
        .post(
            "/contacts/create",
            &[
                ("csrf_token", token.as_str()),
                ("first", "A"),
                ("last", "B"),
                ("phone", "(123) 456-7890"),
                ("email", "ab@example.com"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/contacts/view/1"));

    let stored = store.get(1).await.unwrap();
    assert_eq!((stored.first.as_str(), stored.last.as_str()), ("A", "B"));
    assert_eq!(stored.version, 1);

    let view = browser.get("/contacts/view/1").await;
    assert!(view.body.contains("Contact successfully created!"));
    let again = browser.get("/contacts/view/1").await;
    assert!(!again.body.contains("Contact successfully created!"));
}

#[tokio::test]
async fn test_invalid_create_rerenders_with_errors() {
    let (app, store) = test_app();
    let mut browser = Browser::new(app);
    let token = csrf_token(&browser.get("/contacts/create").await.body);

    let long_name = "x".repeat(101);
    let reply = browser
        .post(
            "/contacts/create",
            &[
                ("csrf_token", token.as_str()),
                ("first", long_name.as_str()),
                ("last", "  "),
                ("phone", "123-456-ABCD"),
                ("email", "kept@example"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("This can&#39;t contain more than 100 characters."));
    assert!(reply.body.contains("This field can&#39;t be blank."));
    assert!(reply.body.contains("Invalid phone number."));
    assert!(reply.body.contains(r#"value="kept@example""#));
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_without_csrf_token_is_rejected() {
    let (app, store) = test_app();
    let mut browser = Browser::new(app);
    browser.get("/contacts/create").await;

    let fields = [
        ("first", "A"),
        ("last", "B"),
        ("phone", "123-456-7890"),
        ("email", "ab@example.com"),
    ];
    let reply = browser.post("/contacts/create", &fields).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let mut forged = fields.to_vec();
    forged.push(("csrf_token", "not-the-token"));
    let reply = browser.post("/contacts/create", &forged).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_form_is_bad_request() {
    let (app, store) = test_app();
    let id = seed(&store).await;
    let mut browser = Browser::new(app);
    let token = csrf_token(&browser.get(&format!("/contacts/edit/{id}")).await.body);

    let reply = browser
        .post(
            &format!("/contacts/edit/{id}"),
            &[("csrf_token", token.as_str()), ("version", "not-a-number")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_bumps_version() {
    let (app, store) = test_app();
    let id = seed(&store).await;
    let mut browser = Browser::new(app);

    let edit = browser.get(&format!("/contacts/edit/{id}")).await;
    assert!(edit.body.contains(r#"name="version" value="1""#));
    assert!(edit.body.contains(r#"value="Ada""#));
    let token = csrf_token(&edit.body);

    let reply = browser
        .post(
            &format!("/contacts/edit/{id}"),
            &[
                ("csrf_token", token.as_str()),
                ("id", "1"),
                ("version", "1"),
                ("first", "Augusta"),
                ("last", "King"),
                ("phone", "+441234567890"),
                ("email", "augusta@example.com"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/contacts/view/1"));

    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.first, "Augusta");
    assert_eq!(stored.version, 2);

    let view = browser.get("/contacts/view/1").await;
    assert!(view.body.contains("Contact successfully updated!"));
}

#[tokio::test]
async fn test_stale_edit_redirects_back_with_conflict_flash() {
    let (app, store) = test_app();
    let id = seed(&store).await;
    let mut browser = Browser::new(app);
    let token = csrf_token(&browser.get(&format!("/contacts/edit/{id}")).await.body);

    // Someone else saves first.
    let mut theirs = store.get(id).await.unwrap();
    theirs.first = "Someone".into();
    assert_eq!(store.update(&theirs).await.unwrap(), 2);

    let reply = browser
        .post(
            &format!("/contacts/edit/{id}"),
            &[
                ("csrf_token", token.as_str()),
                ("version", "1"),
                ("first", "Mine"),
                ("last", "Lovelace"),
                ("phone", "123-456-7890"),
                ("email", "ada@example.com"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/contacts/edit/1"));

    let stored = store.get(id).await.unwrap();
    assert_eq!(stored.first, "Someone");
    assert_eq!(stored.version, 2);

    let edit = browser.get("/contacts/edit/1").await;
    assert!(edit
        .body
        .contains("Another user has updated this contact. Please reload and try again."));
    assert!(edit.body.contains(r#"name="version" value="2""#));
}

#[tokio::test]
async fn test_edit_of_deleted_contact_is_not_found() {
    let (app, store) = test_app();
    let id = seed(&store).await;
    let mut browser = Browser::new(app);
    let token = csrf_token(&browser.get(&format!("/contacts/edit/{id}")).await.body);
    store.delete(id).await.unwrap();

    let reply = browser
        .post(
            &format!("/contacts/edit/{id}"),
            &[
                ("csrf_token", token.as_str()),
                ("version", "1"),
                ("first", "Ada"),
                ("last", "Lovelace"),
                ("phone", "123-456-7890"),
                ("email", "ada@example.com"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_flow() {
    let (app, store) = test_app();
    let id = seed(&store).await;
    let mut browser = Browser::new(app);

    let confirm = browser.get(&format!("/contacts/delete/{id}")).await;
    assert_eq!(confirm.status, StatusCode::OK);
    assert!(confirm.body.contains(r#"action="/contacts/delete/1""#));
    let token = csrf_token(&confirm.body);

    let reply = browser
        .post(&format!("/contacts/delete/{id}"), &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/"));
    assert!(matches!(store.get(id).await, Err(StoreError::NotFound)));

    let home = browser.get("/").await;
    assert!(home.body.contains("Contact successfully deleted!"));

    let again = browser
        .post(&format!("/contacts/delete/{id}"), &[("csrf_token", token.as_str())])
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
