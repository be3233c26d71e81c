use actix_web::{HttpRequest, Scope, delete, get, post, put, web};
use serde::Deserialize;
use validator::Validate;

use medora_common::ROLE_ADMIN;
use medora_core::ParentKind;
use medora_core::doctor::{create_doctor, find_doctor, update_doctor};
use medora_persistence::{DoctorChanges, NewDoctor};

use crate::api::model::{location, validate};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DoctorCreateForm {
    department_id: i32,
    hospital_id: i32,
    #[validate(length(min = 1, message = "is required"))]
    name: String,
    #[serde(default)]
    specialization: String,
    #[serde(default)]
    phone: String,
    #[validate(email(message = "must be an email"))]
    email: String,
    password: String,
}

/// The email is fixed at creation since it keys the doctor's account
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DoctorUpdateForm {
    department_id: Option<i32>,
    hospital_id: Option<i32>,
    #[validate(length(min = 1, message = "must not be empty"))]
    name: Option<String>,
    specialization: Option<String>,
    phone: Option<String>,
}

#[get("")]
async fn list(data: web::Data<AppState>) -> ApiResult {
    let doctors = data.entities().doctor_find_all().await?;

    Ok(common::Result::<()>::http_success(doctors))
}

#[get("/{id}")]
async fn find(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let doctor = find_doctor(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(doctor))
}

#[post("")]
async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: web::Json<DoctorCreateForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    validate(&*form)?;
    let form = form.into_inner();

    let doctor = create_doctor(
        data.entities(),
        data.identity(),
        data.account_settings(),
        NewDoctor {
            department_id: form.department_id,
            hospital_id: form.hospital_id,
            name: form.name,
            specialization: form.specialization,
            phone: form.phone,
            email: form.email,
        },
        &form.password,
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "doctor", doctor.id),
        doctor,
    ))
}

#[put("/{id}")]
async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<DoctorUpdateForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    validate(&*form)?;
    let form = form.into_inner();

    let doctor = update_doctor(
        data.entities(),
        path.into_inner(),
        DoctorChanges {
            department_id: form.department_id,
            hospital_id: form.hospital_id,
            name: form.name,
            specialization: form.specialization,
            phone: form.phone,
        },
    )
    .await?;

    Ok(common::Result::<()>::http_message(
        "Doctor updated successfully.",
        doctor,
    ))
}

#[delete("/{id}")]
async fn remove(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let summary = data
        .cascade()
        .delete_with_cascade(ParentKind::Doctor, path.into_inner())
        .await?;

    Ok(common::Result::<()>::http_message(
        "Doctor and associated user deleted successfully.",
        summary,
    ))
}

pub fn routes() -> Scope {
    web::scope("/doctor")
        .service(list)
        .service(find)
        .service(create)
        .service(update)
        .service(remove)
}
