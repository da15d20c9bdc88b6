use actix_web::{
    HttpRequest, HttpResponse,
    error::{JsonPayloadError, PathError, QueryPayloadError},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    // 200 with data
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    // 201 with data
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    // Error with data (e.g., validation errors)
    pub fn error_with_data(data: T, message: &str) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.to_string()),
        }
    }
}

impl ApiResponse<()> {
    // 200 with message only
    pub fn success_message(message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
        })
    }

    // Error response (no data)
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Malformed JSON bodies become a 400 in the standard envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected request body: {}", err);
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected query string: {}", err);
    AppError::BadRequest(format!("Invalid query parameters: {}", err)).into()
}

/// Non-numeric ids and other bad path segments
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected path: {}", err);
    AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use pretty_assertions::assert_eq;

    async fn echo_id(path: web::Path<i32>) -> HttpResponse {
        ApiResponse::success(path.into_inner())
    }

    #[actix_web::test]
    async fn non_numeric_ids_use_the_envelope() {
        let app = test::init_service(
            App::new()
                .app_data(web::PathConfig::default().error_handler(path_error_handler))
                .route("/things/{id}", web::get().to(echo_id)),
        )
        .await;

        let req = test::TestRequest::get().uri("/things/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiResponse<()> = test::read_body_json(resp).await;
        assert!(!body.success);
        assert!(
            body.message
                .is_some_and(|message| message.contains("Invalid path parameter"))
        );

        let req = test::TestRequest::get().uri("/things/42").to_request();
        let body: ApiResponse<i32> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.data, Some(42));
    }
}
