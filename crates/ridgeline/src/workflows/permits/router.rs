use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{PermitId, PermitSubmission, PermitUpdate};
use super::repository::RepositoryError;
use super::service::{PermitService, PermitServiceError};
use crate::identity::IdentityProvider;
use crate::storage::{ObjectStorage, StorageError};
use crate::store::KeyValueStore;
use crate::workflows::access::AccessError;
use crate::workflows::http::{error_response, unauthorized, user_token, JsonBody};

/// Router builder exposing permit intake, review and lookup.
pub fn permit_router<S, O, I>(service: Arc<PermitService<S, O, I>>) -> Router
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route(
            "/permits",
            post(submit_handler::<S, O, I>).get(list_handler::<S, O, I>),
        )
        .route("/permits/by-email", get(by_email_handler::<S, O, I>))
        .route("/permits/:permit_id", put(transition_handler::<S, O, I>))
        .route(
            "/permits/:permit_id/document",
            get(document_handler::<S, O, I>),
        )
        .with_state(service)
}

/// Shared mapping from service failures to the HTTP error contract.
fn failure(error: PermitServiceError, context: &'static str) -> Response {
    match error {
        PermitServiceError::Validation(violation) => {
            error_response(StatusCode::BAD_REQUEST, violation.to_string())
        }
        PermitServiceError::InvalidQuery(reason) => error_response(StatusCode::BAD_REQUEST, reason),
        PermitServiceError::Access(AccessError::Unauthorized) => unauthorized(),
        PermitServiceError::Repository(RepositoryError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "Permit not found")
        }
        PermitServiceError::NoDocument => {
            error_response(StatusCode::NOT_FOUND, "No document attached to this permit")
        }
        PermitServiceError::Storage(StorageError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, "Document not found")
        }
        PermitServiceError::Repository(RepositoryError::Conflict) => {
            error_response(StatusCode::CONFLICT, "permit already exists")
        }
        error @ PermitServiceError::DisallowedTransition { .. } => {
            error_response(StatusCode::CONFLICT, error.to_string())
        }
        other => {
            error!(error = %other, "{context}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
        }
    }
}

pub(crate) async fn submit_handler<S, O, I>(
    State(service): State<Arc<PermitService<S, O, I>>>,
    JsonBody(submission): JsonBody<PermitSubmission>,
) -> Response
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    match service.submit(submission) {
        Ok(permit) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Permit submitted", "permit": permit })),
        )
            .into_response(),
        Err(error) => failure(error, "Failed to submit permit"),
    }
}

pub(crate) async fn list_handler<S, O, I>(
    State(service): State<Arc<PermitService<S, O, I>>>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    match service.list(user_token(&headers)) {
        Ok(permits) => (StatusCode::OK, Json(json!({ "permits": permits }))).into_response(),
        Err(error) => failure(error, "Failed to fetch permits"),
    }
}

pub(crate) async fn transition_handler<S, O, I>(
    State(service): State<Arc<PermitService<S, O, I>>>,
    Path(permit_id): Path<String>,
    headers: HeaderMap,
    JsonBody(update): JsonBody<PermitUpdate>,
) -> Response
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    let id = PermitId(permit_id);
    match service.transition(user_token(&headers), &id, update) {
        Ok(permit) => (
            StatusCode::OK,
            Json(json!({ "message": "Permit updated", "permit": permit })),
        )
            .into_response(),
        Err(error) => failure(error, "Failed to update permit"),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EmailQuery {
    #[serde(default)]
    email: String,
}

pub(crate) async fn by_email_handler<S, O, I>(
    State(service): State<Arc<PermitService<S, O, I>>>,
    Query(query): Query<EmailQuery>,
) -> Response
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    match service.lookup_by_email(&query.email) {
        Ok(permits) => (StatusCode::OK, Json(json!({ "permits": permits }))).into_response(),
        Err(error) => failure(error, "Failed to fetch permits"),
    }
}

pub(crate) async fn document_handler<S, O, I>(
    State(service): State<Arc<PermitService<S, O, I>>>,
    Path(permit_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    let id = PermitId(permit_id);
    match service.document_url(user_token(&headers), &id) {
        Ok(link) => (StatusCode::OK, Json(link)).into_response(),
        Err(error) => failure(error, "Failed to generate document URL"),
    }
}
