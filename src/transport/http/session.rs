//! Cookie-keyed, in-process session store carrying the flash message and the
//! CSRF token.
//!
//! The cookie only holds a random session id; the data stays on the server.
//! A session is written back (and the cookie sent) only when a handler changed
//! it: a flash was set or consumed, or a CSRF token was issued. Tokens are only
//! issued by pages that render a form, so a fresh visitor browsing the list,
//! about or view pages never creates a session.

use crate::transport::http::error::AppError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Default)]
struct SessionData {
    flash: Option<String>,
    csrf_token: Option<String>,
}

struct Entry {
    data: SessionData,
    expires_at: Instant,
}

/// Shared map of live sessions.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    lifetime: Duration,
    secure_cookie: bool,
}

impl SessionStore {
    pub fn new(lifetime: Duration, secure_cookie: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            lifetime,
            secure_cookie,
        }
    }

    async fn load(&self, id: &str) -> Option<SessionData> {
        {
            let entries = self.entries.read().await;
            match entries.get(id) {
                Some(entry) if entry.expires_at > Instant::now() => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().await.remove(id);
        None
    }

    async fn save(&self, id: String, data: SessionData) {
        let entry = Entry {
            data,
            expires_at: Instant::now() + self.lifetime,
        };
        self.entries.write().await.insert(id, entry);
    }

    /// Drops expired sessions and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn cookie(&self, id: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.lifetime.as_secs()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_LIFETIME, false)
    }
}

struct SessionState {
    id: Option<String>,
    data: SessionData,
    modified: bool,
}

/// Per-request handle on the visitor's session.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    fn new(id: Option<String>, data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                data,
                modified: false,
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Stores a message to show on the next rendered page.
    pub fn put_flash(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|s| {
            s.data.flash = Some(message);
            s.modified = true;
        });
    }

    /// Returns the pending flash message, clearing it.
    pub fn pop_flash(&self) -> Option<String> {
        self.with_state(|s| {
            let flash = s.data.flash.take();
            if flash.is_some() {
                s.modified = true;
            }
            flash
        })
    }

    /// The session's CSRF token, issued on first use.
    pub fn csrf_token(&self) -> String {
        self.with_state(|s| {
            if let Some(token) = &s.data.csrf_token {
                return token.clone();
            }
            let token = random_token::<32>();
            s.data.csrf_token = Some(token.clone());
            s.modified = true;
            token
        })
    }

    pub(crate) fn current_csrf_token(&self) -> Option<String> {
        self.with_state(|s| s.data.csrf_token.clone())
    }

    fn take_if_modified(&self) -> Option<(String, SessionData)> {
        self.with_state(|s| {
            if !s.modified {
                return None;
            }
            s.modified = false;
            let id = s.id.get_or_insert_with(random_token::<16>).clone();
            Some((id, s.data.clone()))
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session interceptor is not installed")))
    }
}

fn random_token<const N: usize>() -> String {
    let bytes: [u8; N] = std::array::from_fn(|_| rand::random::<u8>());
    hex::encode(bytes)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Loads the session named by the request cookie (or starts an empty one),
/// exposes it to handlers, and persists it afterwards if it changed.
pub async fn load_and_save(State(store): State<SessionStore>, mut req: Request, next: Next) -> Response {
    let session = match session_id(req.headers()) {
        Some(id) => match store.load(&id).await {
            Some(data) => Session::new(Some(id), data),
            None => Session::new(None, SessionData::default()),
        },
        None => Session::new(None, SessionData::default()),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some((id, data)) = session.take_if_modified() {
        let cookie = store.cookie(&id);
        store.save(id, data).await;
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => tracing::error!(error = %err, "could not encode session cookie"),
        }
    }
    response
}
