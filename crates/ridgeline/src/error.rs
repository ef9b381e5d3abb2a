use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::config::ConfigError;
use crate::identity::IdentityError;
use crate::storage::StorageError;
use crate::telemetry::TelemetryError;
use crate::workflows::access::AccessError;
use crate::workflows::catalog::CatalogError;
use crate::workflows::http::error_response;
use crate::workflows::permits::{PermitServiceError, RepositoryError};

/// Process-level failure surfaced by the service binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("permit workflow error: {0}")]
    Permit(#[from] PermitServiceError),
    #[error("access error: {0}")]
    Access(#[from] AccessError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Permit(err) => match err {
                PermitServiceError::Validation(_) | PermitServiceError::InvalidQuery(_) => {
                    StatusCode::BAD_REQUEST
                }
                PermitServiceError::Access(err) => access_status(err),
                PermitServiceError::Repository(RepositoryError::NotFound)
                | PermitServiceError::NoDocument => StatusCode::NOT_FOUND,
                PermitServiceError::Repository(RepositoryError::Conflict)
                | PermitServiceError::DisallowedTransition { .. } => StatusCode::CONFLICT,
                PermitServiceError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
                PermitServiceError::Repository(RepositoryError::Store(_))
                | PermitServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Access(err) => access_status(err),
            AppError::Catalog(err) => match err {
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Access(err) => access_status(err),
                CatalogError::Store(_) | CatalogError::Seed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Identity(err) => match err {
                IdentityError::InvalidCredentials
                | IdentityError::TokenExpired
                | IdentityError::TokenInvalid(_)
                | IdentityError::UnknownUser => StatusCode::UNAUTHORIZED,
                IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
                IdentityError::Crypto(_) | IdentityError::Unavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Storage(StorageError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Storage(err) if err.is_rejection() => StatusCode::BAD_REQUEST,
            AppError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Storage(StorageError::InvalidSignature | StorageError::Expired) => {
                StatusCode::FORBIDDEN
            }
            AppError::Storage(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Permit(PermitServiceError::Access(AccessError::Unauthorized))
            | AppError::Access(AccessError::Unauthorized)
            | AppError::Catalog(CatalogError::Access(AccessError::Unauthorized)) => {
                "Unauthorized".to_string()
            }
            AppError::Permit(err) => err.to_string(),
            AppError::Access(err) => err.to_string(),
            AppError::Catalog(err) => err.to_string(),
            AppError::Identity(IdentityError::Validation(reason)) => reason.clone(),
            AppError::Identity(_) => "Unauthorized".to_string(),
            AppError::Storage(err) => err.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

fn access_status(err: &AccessError) -> StatusCode {
    match err {
        AccessError::Unauthorized => StatusCode::UNAUTHORIZED,
        AccessError::Validation(_) => StatusCode::BAD_REQUEST,
        AccessError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
            return error_response(status, "Internal server error");
        }
        error_response(status, self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::workflows::permits::SubmissionViolation;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn validation_reason_reaches_caller() {
        let error = AppError::from(PermitServiceError::Validation(
            SubmissionViolation::MissingField { field: "email" },
        ));
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email is required");
    }

    #[tokio::test]
    async fn authorization_failures_stay_generic() {
        let error = AppError::from(CatalogError::Access(AccessError::Unauthorized));
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn upstream_failures_hide_details() {
        let error = AppError::from(AccessError::Store(StoreError::Unavailable(
            "replica lagging at 10.0.0.4".to_string(),
        )));
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn missing_tour_is_not_found() {
        assert_eq!(
            AppError::from(CatalogError::NotFound("Tour")).status(),
            StatusCode::NOT_FOUND
        );
    }
}
