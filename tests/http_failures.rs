//! Server-side failures through the full router: store errors and handler
//! panics, with and without `--debug`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONNECTION;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use contacts_app::storage::StoreResult;
use contacts_app::transport::http::error::ServerErrorReport;
use contacts_app::{create_router, AppState, Config, Contact, ContactStore, StoreError};
use std::sync::Arc;
use tower::ServiceExt;

const PANIC_MESSAGE: &str = "contact store exploded";

/// A store whose every call fails, either with a database error or a panic.
struct BrokenStore {
    panics: bool,
}

impl BrokenStore {
    fn fail<T>(&self) -> StoreResult<T> {
        if self.panics {
            panic!("{PANIC_MESSAGE}");
        }
        Err(StoreError::Persistence(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl ContactStore for BrokenStore {
    async fn insert(&self, _first: &str, _last: &str, _phone: &str, _email: &str) -> StoreResult<i32> {
        self.fail()
    }

    async fn get(&self, _id: i32) -> StoreResult<Contact> {
        self.fail()
    }

    async fn list(&self) -> StoreResult<Vec<Contact>> {
        self.fail()
    }

    async fn update(&self, _contact: &Contact) -> StoreResult<i32> {
        self.fail()
    }

    async fn delete(&self, _id: i32) -> StoreResult<()> {
        self.fail()
    }
}

fn app(panics: bool, debug: bool) -> Router {
    let mut args = vec!["contacts-web", "--db-dsn", "postgres://unused/contacts"];
    if debug {
        args.push("--debug");
    }
    let config = Config::from_args(args).unwrap();
    create_router(AppState::new(Arc::new(BrokenStore { panics }), config))
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_store_failure_renders_generic_500() {
    for uri in ["/", "/contacts/view/1"] {
        let response = get(app(false, false), uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(response.extensions().get::<ServerErrorReport>().is_none());

        let body = body_text(response).await;
        assert!(body.contains("500 Internal Server Error"));
        assert!(!body.contains("<pre>"));
        assert!(!body.contains("pool timed out"));
    }
}

#[tokio::test]
async fn test_store_failure_shows_error_chain_in_debug() {
    let response = get(app(false, true), "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.extensions().get::<ServerErrorReport>().is_none());

    let body = body_text(response).await;
    assert!(body.contains("500 Internal Server Error"));
    assert!(body.contains("<pre>database error: pool timed out"));
}

#[tokio::test]
async fn test_handler_panic_becomes_500_and_closes_connection() {
    let response = get(app(true, false), "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers().get(CONNECTION).unwrap(), "close");

    let body = body_text(response).await;
    assert!(body.contains("500 Internal Server Error"));
    assert!(!body.contains(PANIC_MESSAGE));
}

#[tokio::test]
async fn test_handler_panic_message_shown_in_debug() {
    let response = get(app(true, true), "/contacts/view/1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers().get(CONNECTION).unwrap(), "close");

    let body = body_text(response).await;
    assert!(body.contains(&format!("<pre>{PANIC_MESSAGE}</pre>")));
}
