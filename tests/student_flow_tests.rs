mod common;

use axum::http::{Method, StatusCode, header};
use common::{InMemoryRepo, date_string, days_from_today, test_app, test_app_with};
use internship_portal::{MockStorageService, models::Role, textgen::MockTextGenerator};
use serde_json::{Value, json};
use uuid::Uuid;

fn jane() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@uni.edu",
        "password": "Abcdef1!",
        "mobileNumber": "8888888888"
    })
}

fn profile() -> Value {
    json!({
        "DOB": "2001-09-11",
        "collegeName": "State University",
        "yearOfPassout": 2024,
        "areaOfInterest": "Backend",
        "address": {"country": "India", "state": "Karnataka", "city": "Bengaluru"}
    })
}

// --- Registration and login ---

#[tokio::test]
async fn test_register_student_success() {
    let app = test_app();

    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(jane()))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Student registered successfully");
    assert_eq!(body["data"]["email"], "jane@uni.edu");
    assert_eq!(body["data"]["mobileNumber"], "8888888888");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"]["DOB"].is_null());
}

#[tokio::test]
async fn test_register_student_rejects_bad_name_and_duplicates() {
    let app = test_app();

    let mut bad_name = jane();
    bad_name["name"] = json!("J4ne");
    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(bad_name))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid name");

    app.send(Method::POST, "/students/register", None, Some(jane()))
        .await;

    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(jane()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "The provided email already exists");

    let mut same_mobile = jane();
    same_mobile["email"] = json!("other@uni.edu");
    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(same_mobile))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Provided mobile number already exists");
}

#[tokio::test]
async fn test_register_student_duplicates_found_only_by_constraint() {
    let app = test_app_with(
        InMemoryRepo::racing(),
        MockStorageService::new(),
        MockTextGenerator::failing(),
    );
    app.repo.seed_student("Jane", "jane@uni.edu", "1111111111");
    app.repo.seed_student("Jim", "jim@uni.edu", "8888888888");

    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(jane()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "The provided email already exists");
    assert_eq!(body["data"]["field"], "email");

    let mut same_mobile = jane();
    same_mobile["email"] = json!("other@uni.edu");
    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(same_mobile))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Provided mobile number already exists");
    assert_eq!(body["data"]["field"], "mobileNumber");
}

#[tokio::test]
async fn test_register_student_missing_mobile() {
    let app = test_app();
    let mut payload = jane();
    payload.as_object_mut().unwrap().remove("mobileNumber");

    let (status, _, body) = app
        .send(Method::POST, "/students/register", None, Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "MobileNumber is required");
    assert_eq!(body["data"]["field"], "mobileNumber");
}

#[tokio::test]
async fn test_login_student_success_and_failures() {
    let app = test_app();
    app.send(Method::POST, "/students/register", None, Some(jane()))
        .await;

    let (status, headers, body) = app
        .send(
            Method::POST,
            "/students/login",
            None,
            Some(json!({"email": "jane@uni.edu", "password": "Abcdef1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student login successfully");
    assert!(headers.get(header::AUTHORIZATION).is_some());
    let claims = app
        .tokens
        .verify(body["data"]["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.role, Role::Student);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/students/login",
            None,
            Some(json!({"email": "jane@uni.edu", "password": "Abcdef1?"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/students/login",
            None,
            Some(json!({"email": "nobody@uni.edu", "password": "Abcdef1!"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Profile edit ---

#[tokio::test]
async fn test_edit_profile_by_owner() {
    let app = test_app();
    let student = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    let token = app.token_for(student.id, Role::Student);

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/students/{}/profile", student.id),
            Some(&token),
            Some(profile()),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Student details updated successfully");
    assert_eq!(body["data"]["DOB"], "2001-09-11");
    assert_eq!(body["data"]["yearOfPassout"], 2024);
    assert_eq!(body["data"]["address"]["city"], "Bengaluru");
}

#[tokio::test]
async fn test_edit_profile_is_idempotent() {
    let app = test_app();
    let student = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    let token = app.token_for(student.id, Role::Student);
    let uri = format!("/students/{}/profile", student.id);

    let (_, _, first) = app
        .send(Method::PUT, &uri, Some(&token), Some(profile()))
        .await;
    let (status, _, second) = app
        .send(Method::PUT, &uri, Some(&token), Some(profile()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn test_edit_profile_accepts_numeric_string_year() {
    let app = test_app();
    let student = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    let token = app.token_for(student.id, Role::Student);

    let mut payload = profile();
    payload["yearOfPassout"] = json!("2023");

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/students/{}/profile", student.id),
            Some(&token),
            Some(payload),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["yearOfPassout"], 2023);
}

#[tokio::test]
async fn test_edit_profile_of_another_student_is_forbidden() {
    let app = test_app();
    let owner = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    let intruder = app.repo.seed_student("Mallory", "mal@uni.edu", "7777777777");
    let token = app.token_for(intruder.id, Role::Student);

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/students/{}/profile", owner.id),
            Some(&token),
            Some(profile()),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized to update student details");
}

#[tokio::test]
async fn test_edit_profile_with_company_token_is_forbidden() {
    let app = test_app();
    let student = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    // Same id, wrong kind of party.
    let token = app.token_for(student.id, Role::Company);

    let (status, _, _) = app
        .send(
            Method::PUT,
            &format!("/students/{}/profile", student.id),
            Some(&token),
            Some(profile()),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_edit_profile_rejections() {
    let app = test_app();
    let student = app.repo.seed_student("Jane", "jane@uni.edu", "8888888888");
    let token = app.token_for(student.id, Role::Student);
    let uri = format!("/students/{}/profile", student.id);

    let with = |key: &str, value: Value| {
        let mut payload = profile();
        payload[key] = value;
        payload
    };
    let without = |key: &str| {
        let mut payload = profile();
        payload.as_object_mut().unwrap().remove(key);
        payload
    };

    let cases = [
        (json!({}), "Provide data to edit/update student details"),
        (without("DOB"), "DOB is required"),
        (with("DOB", json!("11-09-2001")), "Invalid date format"),
        (
            with("DOB", json!(date_string(days_from_today(1)))),
            "DOB must be in the past",
        ),
        (without("collegeName"), "CollegeName is required"),
        (without("yearOfPassout"), "YearOfPassout is required"),
        (with("yearOfPassout", json!("soon")), "YearOfPassout must be a number"),
        (
            with("yearOfPassout", json!(1850)),
            "YearOfPassout must be between 1900 and 2100",
        ),
        (without("areaOfInterest"), "AreaOfInterest is required"),
        (without("address"), "Address is required and must be an object"),
        (
            with("address", json!({"state": "Karnataka", "city": "Bengaluru"})),
            "Country is required",
        ),
        (
            with("address", json!({"country": "India", "city": "Bengaluru"})),
            "State is required",
        ),
        (
            with("address", json!({"country": "India", "state": "Karnataka"})),
            "City is required",
        ),
    ];

    for (payload, expected) in cases {
        let (status, _, body) = app
            .send(Method::PUT, &uri, Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{expected}");
        assert_eq!(body["message"], expected);
    }
}

#[tokio::test]
async fn test_edit_profile_unknown_and_malformed_student() {
    let app = test_app();
    let ghost = Uuid::new_v4();
    let token = app.token_for(ghost, Role::Student);

    let (status, _, body) = app
        .send(
            Method::PUT,
            &format!("/students/{ghost}/profile"),
            Some(&token),
            Some(profile()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Student not found");

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/students/not-an-id/profile",
            Some(&token),
            Some(profile()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid studentId");
}
