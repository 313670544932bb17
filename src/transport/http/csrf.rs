//! CSRF protection for form posts.
//!
//! Rendered forms embed the session token in a hidden `csrf_token` input. For
//! state-changing methods the urlencoded body is buffered, the token compared
//! against the session's, and the untouched body passed on to the handler.

use crate::transport::http::error::AppError;
use crate::transport::http::session::Session;
use axum::body::Body;
use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

pub const CSRF_FIELD: &str = "csrf_token";

const MAX_FORM_BYTES: usize = 64 * 1024;

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn submitted_token(body: &[u8]) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find(|(name, _)| name == CSRF_FIELD)
        .map(|(_, value)| value)
}

fn tokens_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Rejects unsafe requests whose form token does not match the session token.
pub async fn verify_csrf(req: Request, next: Next) -> Result<Response, AppError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let session = req
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("CSRF check needs the session interceptor")))?;

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|err| AppError::BadRequest(format!("unreadable form body: {err}")))?;

    let verified = match (submitted_token(&bytes), session.current_csrf_token()) {
        (Some(submitted), Some(expected)) => tokens_match(submitted.as_bytes(), expected.as_bytes()),
        _ => false,
    };
    if !verified {
        tracing::warn!(method = %parts.method, uri = %parts.uri, "CSRF token missing or invalid");
        return Err(AppError::BadRequest("CSRF token missing or invalid".to_string()));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
