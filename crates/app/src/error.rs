use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::{AppServicesError, SelectionError};
use storage::catalog::CatalogError;
use thiserror::Error;
use tracing::{error, warn};
use vocab_core::model::{Category, ModeError};

use crate::config::ConfigError;

/// Request-level failures, rendered as plain-text responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Query parameter is absent: {0}")]
    MissingParameter(&'static str),

    #[error("Request body is empty")]
    EmptyBody,

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidMode(#[from] ModeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("No word record at index {index} of {category}")]
    MissingWord { category: Category, index: usize },
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingParameter(_)
            | AppError::MalformedPayload(_)
            | AppError::InvalidMode(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyBody => StatusCode::LENGTH_REQUIRED,
            AppError::Selection(err) => selection_status(err),
            AppError::MissingWord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn selection_status(err: &SelectionError) -> StatusCode {
    match err {
        SelectionError::UnknownCategory(_) => StatusCode::NOT_IMPLEMENTED,
        SelectionError::EmptyCategory(_) => StatusCode::NO_CONTENT,
        err if err.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(err = %self, "Request failed");
        } else {
            warn!(err = %self, %status, "Request rejected");
        }

        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }
        (status, self.to_string()).into_response()
    }
}

/// Failures that stop the server from starting or shutting down cleanly.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Services(#[from] AppServicesError),

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::StorageError;
    use vocab_core::model::{ProgressKey, UnknownCategory, Username, UsernameError};

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn client_errors_map_to_4xx_and_501() {
        assert_eq!(
            status_of(SelectionError::UnknownCategory(UnknownCategory("x".into()))),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(SelectionError::OutOfRangeIndex { index: 12, count: 10 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SelectionError::InvalidUsername(UsernameError::Empty)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::EmptyBody), StatusCode::LENGTH_REQUIRED);
        assert_eq!(
            status_of(AppError::MissingParameter("username")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn empty_category_is_no_content() {
        assert_eq!(
            status_of(SelectionError::EmptyCategory(Category::Adverbs)),
            StatusCode::NO_CONTENT
        );
    }

    #[test]
    fn server_errors_map_to_500() {
        assert_eq!(
            status_of(SelectionError::Persistence(StorageError::Connection(
                "down".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let key = ProgressKey::new(Username::parse("alice").unwrap(), Category::Verbs);
        assert_eq!(
            status_of(SelectionError::InternalInconsistency { key }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
