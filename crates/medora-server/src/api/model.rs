//! Shared request helpers and response views

use std::collections::HashMap;
use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{error::JsonPayloadError, web};
use futures::StreamExt;
use serde::Serialize;
use validator::{Validate, ValidationErrors};

use medora_common::MedoraError;
use medora_persistence::{DepartmentInfo, HospitalInfo, ImageRef};

use crate::error::{AppError, PARAMETER_VALIDATE_ERROR, RESOURCE_NOT_FOUND};
use crate::model::common::{self, AppState};

/// Uploads above this size are rejected
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Upper bound for all text fields of one multipart form together
pub const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Forms with more parts than this are rejected
pub const MAX_FORM_FIELDS: usize = 16;

/// Malformed JSON bodies answer with the standard envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        let message = err.to_string();
        let response = common::Result::<String>::http_response(
            400,
            PARAMETER_VALIDATE_ERROR.code,
            message,
            "ValidationFailed".to_string(),
        );
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{} {}", field, reason)
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

/// Run the derive validators of a request body
pub fn validate<T: Validate>(body: &T) -> Result<(), MedoraError> {
    body.validate()
        .map_err(|errors| MedoraError::ValidationFailed(describe(&errors)))
}

/// URL of a resource, used for `Location` headers
pub fn location(data: &web::Data<AppState>, resource: &str, id: i32) -> String {
    format!("{}/{}/{}", data.context_path(), resource, id)
}

/// 404 for list endpoints that treat an empty result as missing
pub fn empty_list(message: &str) -> actix_web::HttpResponse {
    common::Result::<Vec<()>>::http_response(
        404,
        RESOURCE_NOT_FOUND.code,
        message.to_string(),
        Vec::<()>::new(),
    )
}

// ============================================================================
// Multipart forms
// ============================================================================

/// Text fields and the optional `image` file of a multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<Vec<u8>>,
}

impl MultipartForm {
    pub async fn read(mut payload: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        let mut parts = 0;
        let mut text_bytes = 0;

        while let Some(field) = payload.next().await {
            let mut field = field.map_err(|e| invalid_form(e.to_string()))?;
            parts += 1;
            if parts > MAX_FORM_FIELDS {
                return Err(invalid_form(format!(
                    "more than {} parts",
                    MAX_FORM_FIELDS
                )));
            }
            let name = field.name().unwrap_or_default().to_string();
            let is_image = name == "image";

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| invalid_form(e.to_string()))?;
                if is_image {
                    if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                        return Err(invalid_form(format!(
                            "field {} exceeds {} bytes",
                            name, MAX_IMAGE_BYTES
                        )));
                    }
                } else {
                    text_bytes += chunk.len();
                    if text_bytes > MAX_TEXT_BYTES {
                        return Err(invalid_form(format!(
                            "text fields exceed {} bytes",
                            MAX_TEXT_BYTES
                        )));
                    }
                }
                bytes.extend_from_slice(&chunk);
            }

            if is_image {
                if !bytes.is_empty() {
                    form.image = Some(bytes);
                }
            } else {
                let text =
                    String::from_utf8(bytes).map_err(|_| invalid_form(format!("{} is not text", name)))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(|v| v.trim().to_string())
    }

    pub fn text_or_default(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    pub fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>, MedoraError> {
        match self.text(name) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| MedoraError::ValidationFailed(format!("{} must be a number", name))),
        }
    }

    pub fn required_number<T: FromStr>(&self, name: &str) -> Result<T, MedoraError> {
        self.number(name)?
            .ok_or_else(|| MedoraError::ValidationFailed(format!("{} is required", name)))
    }
}

fn invalid_form(message: String) -> AppError {
    MedoraError::ValidationFailed(format!("invalid multipart form: {}", message)).into()
}

// ============================================================================
// Response views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalView {
    #[serde(flatten)]
    pub hospital: HospitalInfo,
    pub image: Option<ImageRef>,
}

impl HospitalView {
    pub fn new(data: &AppState, hospital: HospitalInfo) -> Self {
        let image = ImageRef::resolve(
            data.image_mode(),
            hospital.image.as_deref(),
            &data.context_path(),
            "hospital",
            hospital.id,
        );
        Self { hospital, image }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentView {
    #[serde(flatten)]
    pub department: DepartmentInfo,
    pub image: Option<ImageRef>,
}

impl DepartmentView {
    pub fn new(data: &AppState, department: DepartmentInfo) -> Self {
        let image = ImageRef::resolve(
            data.image_mode(),
            department.image.as_deref(),
            &data.context_path(),
            "department",
            department.id,
        );
        Self { department, image }
    }
}

/// Raw image bytes, guessing the content type from the leading magic bytes
pub fn image_response(bytes: Vec<u8>) -> actix_web::HttpResponse {
    let content_type = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    };
    actix_web::HttpResponse::Ok()
        .content_type(content_type)
        .body(bytes)
}
