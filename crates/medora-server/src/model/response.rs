//! HTTP response types for the Medora server
//!
//! Every handler answers with the `{code, message, data}` envelope, except
//! authorization rejections which use [`ErrorResult`].

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode, http::header};
use serde::{Deserialize, Serialize};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    /// 200 with a human readable message next to the payload
    pub fn http_message(message: &str, data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::new(0, message.to_string(), data))
    }

    /// 201 pointing at the new resource
    pub fn http_created(location: &str, data: impl Serialize) -> HttpResponse {
        HttpResponse::Created()
            .insert_header((header::LOCATION, location.to_string()))
            .json(Result::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(Result::new(code, message, data))
    }
}

/// Error body for rejected authentication and authorization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResult {
    pub timestamp: String,
    pub status: i32,
    pub error: String,
    pub message: String,
    pub path: String,
}

impl ErrorResult {
    pub fn new(status: StatusCode, message: &str, path: &str) -> Self {
        ErrorResult {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16() as i32,
            error: status.canonical_reason().unwrap_or_default().to_string(),
            message: message.to_string(),
            path: path.to_string(),
        }
    }

    pub fn http_response(status: StatusCode, message: &str, path: &str) -> HttpResponse {
        HttpResponseBuilder::new(status).json(ErrorResult::new(status, message, path))
    }

    pub fn http_response_unauthorized(message: &str, path: &str) -> HttpResponse {
        Self::http_response(StatusCode::UNAUTHORIZED, message, path)
    }

    pub fn http_response_forbidden(message: &str, path: &str) -> HttpResponse {
        Self::http_response(StatusCode::FORBIDDEN, message, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let result = Result::success(vec![1, 2]);
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "success");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_created_sets_location() {
        let response = Result::<()>::http_created("/api/hospital/3", "ok");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/hospital/3"
        );
    }

    #[test]
    fn test_error_result() {
        let result = ErrorResult::new(StatusCode::FORBIDDEN, "authorization failed!.", "/api/x");
        assert_eq!(result.status, 403);
        assert_eq!(result.error, "Forbidden");

        let response = ErrorResult::http_response_unauthorized("no token provided", "/api/x");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
