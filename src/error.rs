use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Unsupported modelId: {0}")]
    UnsupportedModel(String),
    #[error("Missing collectionId")]
    MissingCollectionId,
    #[error("Invalid payload")]
    InvalidPayload,
    #[error("Database not configured")]
    StoreNotConfigured,
    #[error("Generation failed")]
    GenerationFailed,
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl StudioError {
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ResponseError for StudioError {
    fn status_code(&self) -> StatusCode {
        match self {
            StudioError::UnsupportedModel(_)
            | StudioError::MissingCollectionId
            | StudioError::InvalidPayload => StatusCode::BAD_REQUEST,
            StudioError::StoreNotConfigured => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Upstream detail stays in the server log.
        let message = match self {
            StudioError::GenerationFailed => self.to_string(),
            _ if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(status).json(ErrorBody { error: message })
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StudioError::UnsupportedModel("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StudioError::StoreNotConfigured.status_code(),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            StudioError::StorageError("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(StudioError::InvalidPayload.is_client_error());
        assert!(!StudioError::GenerationFailed.is_client_error());
    }

    #[test]
    fn test_unsupported_model_message() {
        let err = StudioError::UnsupportedModel("unknown-model".into());
        assert_eq!(err.to_string(), "Unsupported modelId: unknown-model");
    }
}
