//! Mapping from domain errors to JSON HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use repogrid_core::{AppError, CatalogError};
use serde_json::json;

/// Handler error: an [`AppError`] rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound | AppError::Catalog(CatalogError::NotFound) => StatusCode::NOT_FOUND,
        AppError::BadRequest(_) | AppError::Catalog(_) => StatusCode::BAD_REQUEST,
        AppError::Source(_) => StatusCode::BAD_GATEWAY,
        AppError::Server(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
            match self.0 {
                AppError::Source(_) => "Upstream error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repogrid_core::SourceError;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(status_for(&AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&AppError::Catalog(CatalogError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&AppError::Catalog(CatalogError::MalformedCursor)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AppError::Source(SourceError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(&AppError::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn server_errors_hide_details() {
        let response = HttpError(AppError::Server("disk on fire".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
