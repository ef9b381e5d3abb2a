use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::access::AccessControl;
use crate::workflows::http::USER_TOKEN_HEADER;
use crate::workflows::permits::{
    permit_router, PermitService, PermitSettings, PermitStatus, TransitionPolicy,
};

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(USER_TOKEN_HEADER, token);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(USER_TOKEN_HEADER, token);
    }
    builder.body(Body::empty()).expect("request builds")
}

fn submission_body(document_path: &str) -> Value {
    json!({
        "fullName": "Tsering Dolma",
        "email": RIDER_EMAIL,
        "destination": "Pangong Tso",
        "idType": "AADHAAR",
        "idNumber": "1234-5678-9012",
        "dlNumber": "JK-1020304",
        "documentPath": document_path,
    })
}

#[tokio::test]
async fn submit_returns_created_record() {
    let harness = harness();
    let router = permit_router(Arc::new(harness.service(PermitSettings::default())));

    let response = router
        .oneshot(json_request(
            "POST",
            "/permits",
            None,
            submission_body("permits/id.pdf"),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Permit submitted");
    assert_eq!(payload["permit"]["status"], "PENDING");
    assert_eq!(payload["permit"]["idType"], "AADHAAR");
    assert!(payload["permit"]["submittedAt"].is_string());
    assert!(payload["permit"].get("updatedAt").is_none());
}

#[tokio::test]
async fn submit_with_missing_field_is_bad_request() {
    let harness = harness();
    let router = permit_router(Arc::new(harness.service(PermitSettings::default())));
    let mut body = submission_body("permits/id.pdf");
    body["fullName"] = json!("");

    let response = router
        .oneshot(json_request("POST", "/permits", None, body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await["error"],
        "fullName is required"
    );
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn admin_routes_hide_the_reason_for_refusal() {
    let harness = harness();
    harness.admin_token();
    let (_, rider) = harness.session_for(RIDER_EMAIL);
    let router = permit_router(Arc::new(harness.service(PermitSettings::default())));

    for request in [
        get_request("/permits", None),
        get_request("/permits", Some(&rider)),
        get_request("/permits", Some("not-a-token")),
        get_request("/permits/123-abc/document", Some(&rider)),
        json_request(
            "PUT",
            "/permits/123-abc",
            Some(&rider),
            json!({ "status": "APPROVED" }),
        ),
    ] {
        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json_body(response).await, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn by_email_returns_only_the_public_projection() {
    let harness = harness();
    let service = Arc::new(harness.service(PermitSettings::default()));
    service
        .submit(submission("permits/id.pdf"))
        .expect("submit succeeds");
    let router = permit_router(service);

    let response = router
        .oneshot(get_request(
            "/permits/by-email?email=Rider%40Ridgeline.test",
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let permits = payload["permits"].as_array().expect("permits array");
    assert_eq!(permits.len(), 1);

    let mut keys: Vec<&str> = permits[0]
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["destination", "id", "status", "submittedAt", "updatedAt"]
    );
    assert_eq!(permits[0]["updatedAt"], Value::Null);
}

#[tokio::test]
async fn by_email_without_email_is_bad_request() {
    let harness = harness();
    let router = permit_router(Arc::new(harness.service(PermitSettings::default())));

    for uri in ["/permits/by-email", "/permits/by-email?email="] {
        let response = router
            .clone()
            .oneshot(get_request(uri, None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn transition_and_document_routes_for_admins() {
    let harness = harness();
    let admin = harness.admin_token();
    let path = harness.upload_document();
    let service = Arc::new(harness.service(PermitSettings::default()));
    let permit = service.submit(submission(&path)).expect("submit succeeds");
    let router = permit_router(service);

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/permits/{}", permit.id),
            Some(&admin),
            json!({ "status": "REJECTED", "adminNotes": "Blurred scan", "documentPath": "" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["permit"]["status"], "REJECTED");
    assert_eq!(payload["permit"]["adminNotes"], "Blurred scan");
    assert_eq!(payload["permit"]["documentPath"], path.as_str());

    let response = router
        .clone()
        .oneshot(get_request(
            &format!("/permits/{}/document", permit.id),
            Some(&admin),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["path"], path.as_str());
    assert!(payload["url"]
        .as_str()
        .is_some_and(|url| url.contains("expires=")));

    let response = router
        .oneshot(json_request(
            "PUT",
            "/permits/does-not-exist",
            Some(&admin),
            json!({ "status": "APPROVED" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["error"], "Permit not found");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests_with_error_envelope() {
    let harness = harness();
    let admin = harness.admin_token();
    let service = Arc::new(harness.service(PermitSettings::default()));
    let permit = service
        .submit(submission("permits/id.pdf"))
        .expect("submit succeeds");
    let router = permit_router(service.clone());

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/permits/{}", permit.id),
            Some(&admin),
            json!({ "status": "approved" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json_body(response).await["error"].is_string());

    let response = router
        .oneshot(
            Request::post("/permits")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"fullName\": "))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json_body(response).await["error"].is_string());

    let unchanged = service
        .lookup_by_email(RIDER_EMAIL)
        .expect("lookup succeeds");
    assert_eq!(unchanged.len(), 1);
    assert_eq!(unchanged[0].status, PermitStatus::Pending);
}

#[tokio::test]
async fn guarded_transition_conflicts() {
    let harness = harness();
    let admin = harness.admin_token();
    let service = Arc::new(harness.service(PermitSettings {
        transitions: TransitionPolicy::Guarded,
        ..PermitSettings::default()
    }));
    let permit = service
        .submit(submission("permits/id.pdf"))
        .expect("submit succeeds");
    let router = permit_router(service);

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/permits/{}", permit.id),
            Some(&admin),
            json!({ "status": "APPROVED" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_outage_is_a_generic_server_error() {
    let harness = harness();
    let store = Arc::new(UnavailableStore);
    let service = PermitService::new(
        store.clone(),
        harness.objects.clone(),
        AccessControl::new(store, harness.identity.clone()),
        PermitSettings::default(),
    );
    let router = permit_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/permits",
            None,
            submission_body("permits/id.pdf"),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json_body(response).await["error"],
        "Failed to submit permit"
    );

    let response = router
        .oneshot(get_request("/permits/by-email?email=a%40b.c", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
