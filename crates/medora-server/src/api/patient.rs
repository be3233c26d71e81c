use actix_web::{HttpRequest, Scope, get, post, web};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use medora_common::{ROLE_ADMIN, ROLE_DOCTOR};
use medora_core::patient::{find_patient, register_patient};
use medora_persistence::NewPatient;

use crate::api::model::{location, validate};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterForm {
    #[validate(length(min = 1, message = "is required"))]
    first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    last_name: String,
    #[validate(email(message = "must be an email"))]
    email: String,
    #[serde(default)]
    phone: String,
    date_of_birth: Option<NaiveDate>,
    address: Option<String>,
    password: String,
}

/// Self-registration, open to anonymous callers
#[post("")]
async fn register(data: web::Data<AppState>, form: web::Json<RegisterForm>) -> ApiResult {
    validate(&*form)?;
    let form = form.into_inner();

    let patient = register_patient(
        data.entities(),
        data.identity(),
        data.account_settings(),
        NewPatient {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            date_of_birth: form.date_of_birth,
            address: form.address,
        },
        &form.password,
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "patient", patient.id),
        patient,
    ))
}

#[get("")]
async fn list(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    secured!(
        Secured::builder(&req, &data)
            .roles(&[ROLE_ADMIN, ROLE_DOCTOR])
            .build()
    );

    let patients = data.entities().patient_find_all().await?;

    Ok(common::Result::<()>::http_success(patients))
}

#[get("/{id}")]
async fn find(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(
        Secured::builder(&req, &data)
            .roles(&[ROLE_ADMIN, ROLE_DOCTOR])
            .build()
    );

    let patient = find_patient(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(patient))
}

pub fn routes() -> Scope {
    web::scope("/patient")
        .service(register)
        .service(list)
        .service(find)
}
