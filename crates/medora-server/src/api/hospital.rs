use actix_multipart::Multipart;
use actix_web::{HttpRequest, Scope, delete, get, post, put, web};

use medora_common::{MedoraError, ROLE_ADMIN};
use medora_core::ParentKind;
use medora_core::hospital::{create_hospital, find_hospital, update_hospital};
use medora_persistence::{HospitalChanges, NewHospital};

use crate::api::model::{HospitalView, MultipartForm, image_response, location};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[get("")]
async fn list(data: web::Data<AppState>) -> ApiResult {
    let hospitals: Vec<HospitalView> = data
        .entities()
        .hospital_find_all()
        .await?
        .into_iter()
        .map(|h| HospitalView::new(&data, h))
        .collect();

    Ok(common::Result::<()>::http_success(hospitals))
}

#[get("/{id}")]
async fn find(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let hospital = find_hospital(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(HospitalView::new(&data, hospital)))
}

#[get("/{id}/image")]
async fn image(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let id = path.into_inner();
    let hospital = find_hospital(data.entities(), id).await?;

    match hospital.image.filter(|b| !b.is_empty()) {
        Some(bytes) => Ok(image_response(bytes)),
        None => Err(MedoraError::NotFound(format!("Image of hospital {}", id)).into()),
    }
}

#[post("")]
async fn create(req: HttpRequest, data: web::Data<AppState>, payload: Multipart) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let form = MultipartForm::read(payload).await?;
    let hospital = create_hospital(
        data.entities(),
        NewHospital {
            name: form.text_or_default("name"),
            address: form.text_or_default("address"),
            phone: form.text_or_default("phone"),
            email: form.text_or_default("email"),
            image: form.image,
        },
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "hospital", hospital.id),
        HospitalView::new(&data, hospital),
    ))
}

#[put("/{id}")]
async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    payload: Multipart,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let form = MultipartForm::read(payload).await?;
    let changes = HospitalChanges {
        name: form.text("name"),
        address: form.text("address"),
        phone: form.text("phone"),
        email: form.text("email"),
        image: form.image,
    };
    let hospital = update_hospital(data.entities(), path.into_inner(), changes).await?;

    Ok(common::Result::<()>::http_message(
        "Hospital updated successfully.",
        HospitalView::new(&data, hospital),
    ))
}

/// Refused with 409 while departments still belong to the hospital
#[delete("/{id}")]
async fn remove(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let summary = data
        .cascade()
        .delete_with_cascade(ParentKind::Hospital, path.into_inner())
        .await?;

    Ok(common::Result::<()>::http_message(
        "Hospital deleted successfully.",
        summary,
    ))
}

pub fn routes() -> Scope {
    web::scope("/hospital")
        .service(list)
        .service(image)
        .service(find)
        .service(create)
        .service(update)
        .service(remove)
}
