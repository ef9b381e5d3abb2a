use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::service::{AccessControl, AccessError, GrantOutcome};
use crate::identity::{IdentityError, IdentityProvider, Registration, SignUpOutcome};
use crate::store::KeyValueStore;
use crate::workflows::http::{error_response, unauthorized, user_token, JsonBody};

/// Router for admin grants plus the sign-up and sign-in endpoints.
pub fn access_router<S, I>(access: Arc<AccessControl<S, I>>) -> Router
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/make-admin", post(make_admin_handler::<S, I>))
        .route("/check-admin", get(check_admin_handler::<S, I>))
        .route("/signup", post(sign_up_handler::<S, I>))
        .route("/sessions", post(sign_in_handler::<S, I>))
        .with_state(access)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MakeAdminRequest {
    #[serde(default)]
    user_id: String,
}

pub(crate) async fn make_admin_handler<S, I>(
    State(access): State<Arc<AccessControl<S, I>>>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<MakeAdminRequest>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match access.grant_admin(user_token(&headers), &request.user_id) {
        Ok(GrantOutcome::Bootstrapped) => (
            StatusCode::OK,
            Json(json!({ "message": "First admin created" })),
        )
            .into_response(),
        Ok(GrantOutcome::Granted) => (
            StatusCode::OK,
            Json(json!({ "message": "Admin privileges granted" })),
        )
            .into_response(),
        Err(AccessError::Unauthorized) => unauthorized(),
        Err(AccessError::Validation(reason)) => error_response(StatusCode::BAD_REQUEST, reason),
        Err(other) => {
            error!(error = %other, "admin grant failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to grant admin")
        }
    }
}

pub(crate) async fn check_admin_handler<S, I>(
    State(access): State<Arc<AccessControl<S, I>>>,
    headers: HeaderMap,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    let check = access.check_admin(user_token(&headers));
    (StatusCode::OK, Json(check)).into_response()
}

pub(crate) async fn sign_up_handler<S, I>(
    State(access): State<Arc<AccessControl<S, I>>>,
    JsonBody(registration): JsonBody<Registration>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match access.identity().sign_up(registration) {
        Ok(SignUpOutcome::Created(user)) => (
            StatusCode::CREATED,
            Json(json!({ "message": "User created", "user": user })),
        )
            .into_response(),
        Ok(SignUpOutcome::AlreadyExists) => (
            StatusCode::OK,
            Json(json!({ "message": "User already exists", "alreadyExists": true })),
        )
            .into_response(),
        Err(IdentityError::Validation(reason)) => error_response(StatusCode::BAD_REQUEST, reason),
        Err(other) => {
            error!(error = %other, "sign up failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed")
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub(crate) async fn sign_in_handler<S, I>(
    State(access): State<Arc<AccessControl<S, I>>>,
    JsonBody(request): JsonBody<SignInRequest>,
) -> Response
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    match access.identity().sign_in(&request.email, &request.password) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(IdentityError::InvalidCredentials) => {
            warn!("rejected sign in attempt");
            error_response(StatusCode::UNAUTHORIZED, "Invalid email or password")
        }
        Err(other) => {
            error!(error = %other, "sign in failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Sign in failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{InMemoryIdentityProvider, SessionTokenCodec};
    use crate::store::InMemoryKeyValueStore;
    use crate::workflows::http::USER_TOKEN_HEADER;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        let store = Arc::new(InMemoryKeyValueStore::default());
        let identity = Arc::new(InMemoryIdentityProvider::new(
            SessionTokenCodec::new(b"access-router-secret-access-rout".to_vec()),
            Duration::hours(1),
        ));
        access_router(Arc::new(AccessControl::new(store, identity)))
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn signup_signin_bootstrap_and_check() {
        let router = router();
        let credentials = json!({ "email": "lead@ridgeline.test", "password": "chang-la-5360" });

        let response = router
            .clone()
            .oneshot(json_request("/signup", credentials.clone()))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let user_id = read_json(response).await["user"]["id"]
            .as_str()
            .expect("user id")
            .to_string();

        let response = router
            .clone()
            .oneshot(json_request("/signup", credentials.clone()))
            .await
            .expect("route executes");
        assert_eq!(read_json(response).await["alreadyExists"], true);

        let response = router
            .clone()
            .oneshot(json_request("/sessions", credentials))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let token = read_json(response).await["accessToken"]
            .as_str()
            .expect("token")
            .to_string();

        let response = router
            .clone()
            .oneshot(json_request("/make-admin", json!({ "userId": user_id })))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::get("/check-admin")
                    .header(USER_TOKEN_HEADER, token)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        let payload = read_json(response).await;
        assert_eq!(payload["isAdmin"], true);
        assert_eq!(payload["user"]["email"], "lead@ridgeline.test");
    }

    #[tokio::test]
    async fn check_admin_without_token_is_false() {
        let response = router()
            .oneshot(
                Request::get("/check-admin")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "isAdmin": false }));
    }

    #[tokio::test]
    async fn second_grant_without_admin_is_unauthorized() {
        let router = router();
        let first = router
            .clone()
            .oneshot(json_request("/make-admin", json!({ "userId": "user-a" })))
            .await
            .expect("route executes");
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(json_request("/make-admin", json!({ "userId": "user-b" })))
            .await
            .expect("route executes");
        assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(second).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let response = router()
            .oneshot(json_request(
                "/sessions",
                json!({ "email": "ghost@ridgeline.test", "password": "whatever-123" }),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
