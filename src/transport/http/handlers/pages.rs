use crate::domain::contact::Contact;
use crate::transport::http::error::{AppError, AppResult};
use crate::transport::http::session::Session;
use crate::transport::http::types::AppState;
use crate::transport::http::views::{self, PageContext};
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};

const STYLESHEET: &str = include_str!("../static/main.css");

/// Liveness check. Bypasses sessions and CSRF.
pub async fn ping() -> &'static str {
    "OK"
}

pub async fn home(State(state): State<AppState>, session: Session) -> AppResult<Html<String>> {
    let contacts: Vec<Contact> = state.contacts.list().await?;
    let page = PageContext::new(&session);
    Ok(Html(views::home(&page, &contacts)))
}

pub async fn about(session: Session) -> Html<String> {
    let page = PageContext::new(&session);
    Html(views::about(&page))
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
