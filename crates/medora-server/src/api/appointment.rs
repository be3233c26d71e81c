use actix_web::{HttpRequest, Scope, delete, get, post, put, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use medora_common::{ROLE_DOCTOR, ROLE_PATIENT};
use medora_core::appointment::{
    AppointmentDraft, StatusValue, appointment_views, create_appointment, delete_appointment,
    find_appointment, find_treatment, submit_treatment, update_appointment, update_status,
};
use medora_persistence::NewTreatmentRecord;

use crate::api::model::{empty_list, location};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentForm {
    patient_id: i32,
    doctor_id: i32,
    date: NaiveDate,
    time: NaiveTime,
    #[serde(default)]
    reason: String,
    status: Option<StatusValue>,
}

impl From<AppointmentForm> for AppointmentDraft {
    fn from(form: AppointmentForm) -> Self {
        AppointmentDraft {
            patient_id: form.patient_id,
            doctor_id: form.doctor_id,
            date: form.date,
            time: form.time,
            reason: form.reason,
            status: form.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusForm {
    new_status: StatusValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreatmentForm {
    #[serde(default)]
    diagnosis: String,
    #[serde(default)]
    treatment: String,
    prescription: Option<String>,
    notes: Option<String>,
}

#[get("")]
async fn list(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let appointments = data.entities().appointment_find_all().await?;
    let views = appointment_views(data.entities(), appointments).await?;

    Ok(common::Result::<()>::http_success(views))
}

#[get("/doctor/{doctor_id}")]
async fn by_doctor(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let appointments = data
        .entities()
        .appointment_find_by_doctor(path.into_inner())
        .await?;
    if appointments.is_empty() {
        return Ok(empty_list("No appointments found for this doctor."));
    }

    let views = appointment_views(data.entities(), appointments).await?;
    Ok(common::Result::<()>::http_success(views))
}

#[get("/patient/{patient_id}")]
async fn by_patient(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let appointments = data
        .entities()
        .appointment_find_by_patient(path.into_inner())
        .await?;
    if appointments.is_empty() {
        return Ok(empty_list("No appointments found for this patient."));
    }

    let views = appointment_views(data.entities(), appointments).await?;
    Ok(common::Result::<()>::http_success(views))
}

#[get("/{id}")]
async fn find(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let appointment = find_appointment(data.entities(), path.into_inner()).await?;
    let mut views = appointment_views(data.entities(), vec![appointment]).await?;

    Ok(common::Result::<()>::http_success(views.pop()))
}

#[post("")]
async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: web::Json<AppointmentForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_PATIENT).build());

    let appointment = create_appointment(data.entities(), form.into_inner().into()).await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "appointment", appointment.id),
        appointment,
    ))
}

/// Full replacement of the appointment fields
#[put("/{id}")]
async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<AppointmentForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_PATIENT).build());

    let appointment =
        update_appointment(data.entities(), path.into_inner(), form.into_inner().into()).await?;

    Ok(common::Result::<()>::http_message(
        "Appointment updated successfully.",
        appointment,
    ))
}

#[put("/{id}/status")]
async fn change_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<StatusForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let appointment = update_status(data.entities(), path.into_inner(), &form.new_status).await?;

    Ok(common::Result::<()>::http_message(
        "Appointment status updated successfully.",
        appointment,
    ))
}

#[delete("/{id}")]
async fn remove(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_PATIENT).build());

    delete_appointment(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_message(
        "Appointment deleted successfully.",
        (),
    ))
}

#[post("/{id}/treatment")]
async fn create_treatment(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<TreatmentForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_DOCTOR).build());

    let appointment_id = path.into_inner();
    let form = form.into_inner();
    let record = submit_treatment(
        data.entities(),
        NewTreatmentRecord {
            appointment_id,
            diagnosis: form.diagnosis,
            treatment: form.treatment,
            prescription: form.prescription,
            notes: form.notes,
        },
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &format!("{}/treatment", location(&data, "appointment", appointment_id)),
        record,
    ))
}

#[get("/{id}/treatment")]
async fn treatment(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).build());

    let record = find_treatment(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(record))
}

pub fn routes() -> Scope {
    web::scope("/appointment")
        .service(list)
        .service(by_doctor)
        .service(by_patient)
        .service(find)
        .service(create)
        .service(update)
        .service(change_status)
        .service(remove)
        .service(create_treatment)
        .service(treatment)
}
