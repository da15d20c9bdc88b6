use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[macro_use]
mod common;

fn fields(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| error["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[actix_web::test]
async fn test_setup_reports_every_invalid_field() {
    let state = common::lazy_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/setup")
        .set_json(json!({
            "username": "ab",
            "email": "not-an-email",
            "fullName": "A",
            "password": "123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        fields(&body),
        vec!["username", "email", "fullName", "password"]
    );
}

#[actix_web::test]
async fn test_login_requires_both_fields() {
    let state = common::lazy_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "  ", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_json_uses_the_envelope() {
    let state = common::lazy_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"username\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(resp).await;
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("Bad request: Invalid request body"))
    );
}

#[actix_web::test]
async fn test_reset_password_rejects_short_passwords() {
    let state = common::lazy_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/reset-password")
        .set_json(json!({ "token": "abc", "newPassword": "123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(resp).await;
    assert_eq!(fields(&body), vec!["newPassword"]);
}

#[actix_web::test]
async fn test_recover_rejects_short_passwords() {
    let state = common::lazy_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/recover")
        .set_json(json!({
            "usernameOrEmail": "admin",
            "recoveryKey": "AAAAA-BBBBB-CCCCC-DDDDD",
            "newPassword": "x"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
