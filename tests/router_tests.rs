mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::test_app;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_unknown_endpoint_uses_error_envelope() {
    let app = test_app();

    let (status, _, body) = app.send(Method::GET, "/does-not-exist", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "Endpoint is not correct");
}

#[tokio::test]
async fn test_wrong_method_on_known_path_uses_error_envelope() {
    let app = test_app();

    for (method, uri) in [
        (Method::DELETE, "/companies/register"),
        (Method::GET, "/students/login"),
    ] {
        let (status, _, body) = app.send(method, uri, None, None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(body["status"], false);
        assert_eq!(body["message"], "Method not allowed");
    }
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = test_app();

    let (_, headers, _) = app.send(Method::GET, "/does-not-exist", None, None).await;

    let request_id = headers.get("x-request-id").expect("x-request-id header");
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_openapi_document_lists_every_route() {
    let app = test_app();

    let (status, _, body) = app
        .send(Method::GET, "/api-docs/openapi.json", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/companies/register",
        "/companies/login",
        "/students/register",
        "/students/login",
        "/students/{studentId}/profile",
        "/internships",
        "/internships/company/{companyId}",
        "/internships/description-draft",
        "/internships/{internshipId}",
        "/internships/{internshipId}/applications",
        "/applications/resume-upload",
        "/applications/{studentId}",
    ] {
        assert!(paths.contains_key(path), "{path}");
    }
}
