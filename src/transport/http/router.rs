use crate::transport::http::handlers::{contacts, pages};
use crate::transport::http::types::AppState;
use crate::transport::http::{csrf, middleware, session};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;

/// Builds the application router.
///
/// Interceptors, outermost first:
/// panic recovery, request logging, secure headers, server-error reporting,
/// then for page routes only session load/save and CSRF verification.
/// `/ping` and `/static/*` skip sessions and CSRF.
pub fn create_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/contacts/view/:id", get(contacts::contact_view))
        .route(
            "/contacts/create",
            get(contacts::contact_create).post(contacts::contact_create_post),
        )
        .route(
            "/contacts/edit/:id",
            get(contacts::contact_edit).post(contacts::contact_edit_post),
        )
        .route(
            "/contacts/delete/:id",
            get(contacts::contact_delete).post(contacts::contact_delete_post),
        )
        .layer(from_fn(csrf::verify_csrf))
        .layer(from_fn_with_state(state.sessions.clone(), session::load_and_save));

    Router::new()
        .route("/ping", get(pages::ping))
        .route("/static/main.css", get(pages::stylesheet))
        .merge(page_routes)
        .fallback(pages::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::report_server_errors))
        .layer(from_fn(middleware::secure_headers))
        .layer(from_fn_with_state(state.clone(), middleware::log_request))
        .layer(CatchPanicLayer::custom(middleware::panic_response(state.config.debug)))
        .with_state(state)
}
