// Error handling for the Medora server
// Maps domain errors carried in anyhow::Error to HTTP responses

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use actix_web::http::StatusCode;

pub use medora_common::error::{
    ACCESS_DENIED, CONCURRENCY_CONFLICT, DATA_ACCESS_ERROR, HAS_DEPENDENTS,
    IDENTITY_DELETION_FAILED, INVALID_STATUS, MEDIA_TYPE_ERROR, MISSING_CONTACT_INFO,
    PARAMETER_MISSING, PARAMETER_VALIDATE_ERROR, RESOURCE_CONFLICT, RESOURCE_NOT_FOUND,
    ROLE_REVOCATION_FAILED, SERVER_ERROR, SUCCESS,
};
pub use medora_common::{ErrorCode, MedoraError};

use crate::model::response as common;

// Local wrapper so anyhow errors can implement actix-web's ResponseError
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<MedoraError> for AppError {
    fn from(value: MedoraError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

/// HTTP status for each error category
pub fn status_of(error: &MedoraError) -> StatusCode {
    match error {
        MedoraError::NotFound(_) => StatusCode::NOT_FOUND,
        MedoraError::ValidationFailed(_)
        | MedoraError::MissingContactInfo { .. }
        | MedoraError::RoleRevocationFailed { .. }
        | MedoraError::IdentityDeletionFailed { .. }
        | MedoraError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        MedoraError::AlreadyExists(_)
        | MedoraError::ConcurrencyConflict(_)
        | MedoraError::HasDependents(_) => StatusCode::CONFLICT,
        MedoraError::AuthError(_) => StatusCode::UNAUTHORIZED,
        MedoraError::AccessDenied(_) => StatusCode::FORBIDDEN,
        MedoraError::DatabaseError(_) | MedoraError::InternalError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.downcast_ref::<MedoraError>()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, status_of)
    }

    /// Envelope with the error code, its message and the category name as `data`
    fn error_response(&self) -> HttpResponse {
        if let Some(e) = self.downcast_ref::<MedoraError>() {
            common::Result::<String>::http_response(
                status_of(e).as_u16(),
                e.error_code().code,
                e.to_string(),
                e.category().to_string(),
            )
        } else {
            tracing::error!(error = %self.inner, "unhandled error");
            common::Result::<String>::http_response(
                500,
                SERVER_ERROR.code,
                htmlescape::encode_minimal(&format!("caused: {}", self.inner)),
                "InternalError".to_string(),
            )
        }
    }
}

/// Handler return type; `?` turns domain errors into responses
pub type ApiResult = Result<HttpResponse, AppError>;

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use actix_web::body::MessageBody;

    use super::*;

    fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().try_into_bytes().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_table() {
        assert_eq!(
            status_of(&MedoraError::not_found("Hospital", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(&MedoraError::MissingContactInfo { doctor_id: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(&MedoraError::HasDependents("Hospital 1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(&MedoraError::ConcurrencyConflict("Doctor 1".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(&MedoraError::AuthError("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(&MedoraError::AccessDenied("x".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_domain_error_body() {
        let error = AppError::from(MedoraError::MissingContactInfo { doctor_id: 7 });
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response);
        assert_eq!(body["code"], MISSING_CONTACT_INFO.code);
        assert_eq!(
            body["message"],
            "Doctor with ID 7 has no email associated."
        );
        assert_eq!(body["data"], "MissingContactInfo");
    }

    #[test]
    fn test_unknown_error_is_500() {
        let error = AppError::from(anyhow::anyhow!("disk <full>"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(error.error_response());
        assert_eq!(body["code"], SERVER_ERROR.code);
        assert_eq!(body["message"], "caused: disk &lt;full&gt;");
    }
}
