use crate::storage::StoreError;
use crate::transport::http::views;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Errors a handler can bail out with. Validation failures never get here:
/// handlers re-render the form themselves.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Attached to 500 responses so the error-reporting interceptor can log the
/// cause next to the request line (and show it when running with `--debug`).
#[derive(Debug, Clone)]
pub struct ServerErrorReport(pub String);

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Html(views::error_page(StatusCode::NOT_FOUND, None))).into_response()
            }
            AppError::BadRequest(reason) => {
                tracing::debug!(%reason, "rejecting request");
                (StatusCode::BAD_REQUEST, Html(views::error_page(StatusCode::BAD_REQUEST, None)))
                    .into_response()
            }
            AppError::Internal(err) => {
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page(StatusCode::INTERNAL_SERVER_ERROR, None)),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(ServerErrorReport(format!("{err:?}")));
                response
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let not_found = AppError::from(StoreError::NotFound).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(not_found.extensions().get::<ServerErrorReport>().is_none());

        let internal = AppError::from(StoreError::Persistence(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = internal.extensions().get::<ServerErrorReport>().unwrap();
        assert!(report.0.contains("database error"));
    }
}
