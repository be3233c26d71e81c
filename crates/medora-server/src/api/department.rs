use actix_multipart::Multipart;
use actix_web::{HttpRequest, Scope, delete, get, post, put, web};
use serde::Deserialize;
use validator::Validate;

use medora_common::{MedoraError, ROLE_ADMIN};
use medora_core::ParentKind;
use medora_core::department::{
    create_department, department_doctors, find_department, update_department,
};
use medora_persistence::{DepartmentChanges, NewDepartment};

use crate::api::model::{
    DepartmentView, MultipartForm, empty_list, image_response, location, validate,
};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DepartmentUpdateForm {
    hospital_id: Option<i32>,
    #[validate(length(min = 1, message = "must not be empty"))]
    name: Option<String>,
    description: Option<String>,
}

fn views(data: &AppState, departments: Vec<medora_persistence::DepartmentInfo>) -> Vec<DepartmentView> {
    departments
        .into_iter()
        .map(|d| DepartmentView::new(data, d))
        .collect()
}

#[get("")]
async fn list(data: web::Data<AppState>) -> ApiResult {
    let departments = data.entities().department_find_all().await?;

    Ok(common::Result::<()>::http_success(views(&data, departments)))
}

#[get("/hospital/{hospital_id}")]
async fn by_hospital(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let departments = data
        .entities()
        .department_find_by_hospital(path.into_inner())
        .await?;
    if departments.is_empty() {
        return Ok(empty_list("No departments found for this hospital."));
    }

    Ok(common::Result::<()>::http_success(views(&data, departments)))
}

#[get("/{id}")]
async fn find(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let department = find_department(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(DepartmentView::new(
        &data, department,
    )))
}

#[get("/{id}/image")]
async fn image(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let id = path.into_inner();
    let department = find_department(data.entities(), id).await?;

    match department.image.filter(|b| !b.is_empty()) {
        Some(bytes) => Ok(image_response(bytes)),
        None => Err(MedoraError::NotFound(format!("Image of department {}", id)).into()),
    }
}

#[get("/{id}/doctors")]
async fn doctors(data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let doctors = department_doctors(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(doctors))
}

#[post("")]
async fn create(req: HttpRequest, data: web::Data<AppState>, payload: Multipart) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let form = MultipartForm::read(payload).await?;
    let department = create_department(
        data.entities(),
        NewDepartment {
            hospital_id: form.required_number("hospitalId")?,
            name: form.text_or_default("name"),
            description: form.text_or_default("description"),
            image: form.image,
        },
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "department", department.id),
        DepartmentView::new(&data, department),
    ))
}

#[put("/{id}")]
async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<DepartmentUpdateForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    validate(&*form)?;
    let form = form.into_inner();

    let department = update_department(
        data.entities(),
        path.into_inner(),
        DepartmentChanges {
            hospital_id: form.hospital_id,
            name: form.name,
            description: form.description,
            image: None,
        },
    )
    .await?;

    Ok(common::Result::<()>::http_message(
        "Department updated successfully.",
        DepartmentView::new(&data, department),
    ))
}

/// Removes the department, its doctors and their accounts
#[delete("/{id}")]
async fn remove(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let summary = data
        .cascade()
        .delete_with_cascade(ParentKind::Department, path.into_inner())
        .await?;

    Ok(common::Result::<()>::http_message(
        "Department and all associated doctors have been successfully deleted.",
        summary,
    ))
}

pub fn routes() -> Scope {
    web::scope("/department")
        .service(list)
        .service(by_hospital)
        .service(image)
        .service(doctors)
        .service(find)
        .service(create)
        .service(update)
        .service(remove)
}
