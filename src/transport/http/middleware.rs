//! Request interceptors shared by every route.

use crate::transport::http::error::ServerErrorReport;
use crate::transport::http::types::AppState;
use crate::transport::http::views;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use std::any::Any;
use std::net::SocketAddr;
use std::time::Instant;

const STATIC_SUFFIXES: &[&str] = &[".css", ".js", ".png", ".jpg", ".jpeg", ".ico"];

const SECURE_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
    ),
    ("referrer-policy", "origin-when-cross-origin"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "deny"),
    ("x-xss-protection", "0"),
];

fn is_static_asset(path: &str) -> bool {
    STATIC_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Logs every request with peer address, protocol, method and URI, then the
/// status and latency. Static assets are skipped unless `--verbose` is on.
pub async fn log_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.config.verbose && is_static_asset(req.uri().path()) {
        return next.run(req).await;
    }

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let protocol = format!("{:?}", req.version());
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    tracing::info!(%ip, %protocol, %method, %uri, "received request");

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

/// Sets the OWASP-recommended security headers on every response.
pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    for &(name, value) in SECURE_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

/// Logs the cause behind a 500 produced by a handler. With `--debug` the
/// generic error page is replaced by one that shows the error chain.
pub async fn report_server_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let mut response = next.run(req).await;
    let Some(ServerErrorReport(report)) = response.extensions_mut().remove::<ServerErrorReport>() else {
        return response;
    };

    tracing::error!(%method, %uri, error = %report, "server error");
    if state.config.debug {
        let status = response.status();
        return (status, Html(views::error_page(status, Some(&report)))).into_response();
    }
    response
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Builds the response used when a handler panics: a 500 page and
/// `Connection: close`. The panic message is only shown with `--debug`.
pub fn panic_response(
    debug: bool,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |err| {
        let message = panic_message(err.as_ref());
        tracing::error!(panic = %message, "recovered from handler panic");

        let detail = debug.then_some(message.as_str());
        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(views::error_page(StatusCode::INTERNAL_SERVER_ERROR, detail)),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}
