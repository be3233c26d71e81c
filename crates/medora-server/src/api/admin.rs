use actix_web::{HttpRequest, Scope, delete, get, post, put, web};
use serde::Deserialize;
use validator::Validate;

use medora_common::ROLE_ADMIN;
use medora_core::ParentKind;
use medora_core::admin::{create_admin, find_admin, update_admin};
use medora_persistence::{AdminChanges, NewAdmin};

use crate::api::model::{empty_list, location, validate};
use crate::error::ApiResult;
use crate::model::common::{self, AppState};
use crate::{Secured, secured};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct AdminCreateForm {
    #[validate(length(min = 1, message = "is required"))]
    name: String,
    #[validate(email(message = "must be an email"))]
    email: String,
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct AdminUpdateForm {
    #[validate(length(min = 1, message = "is required"))]
    name: String,
}

#[get("")]
async fn list(req: HttpRequest, data: web::Data<AppState>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let admins = data.entities().admin_find_all().await?;
    if admins.is_empty() {
        return Ok(empty_list("No admins found."));
    }

    Ok(common::Result::<()>::http_success(admins))
}

#[get("/{id}")]
async fn find(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let admin = find_admin(data.entities(), path.into_inner()).await?;

    Ok(common::Result::<()>::http_success(admin))
}

#[post("")]
async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: web::Json<AdminCreateForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    validate(&*form)?;
    let form = form.into_inner();

    let admin = create_admin(
        data.entities(),
        data.identity(),
        data.account_settings(),
        NewAdmin {
            name: form.name,
            email: form.email,
        },
        &form.password,
    )
    .await?;

    Ok(common::Result::<()>::http_created(
        &location(&data, "admin", admin.id),
        admin,
    ))
}

#[put("/{id}")]
async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Json<AdminUpdateForm>,
) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    validate(&*form)?;

    let admin = update_admin(
        data.entities(),
        path.into_inner(),
        AdminChanges {
            name: Some(form.into_inner().name),
        },
    )
    .await?;

    Ok(common::Result::<()>::http_message(
        "Admin updated successfully.",
        admin,
    ))
}

#[delete("/{id}")]
async fn remove(req: HttpRequest, data: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    secured!(Secured::builder(&req, &data).role(ROLE_ADMIN).build());

    let summary = data
        .cascade()
        .delete_with_cascade(ParentKind::Admin, path.into_inner())
        .await?;

    Ok(common::Result::<()>::http_message(
        "Admin and associated user deleted successfully.",
        summary,
    ))
}

pub fn routes() -> Scope {
    web::scope("/admin")
        .service(super::auth::admin_login)
        .service(list)
        .service(find)
        .service(create)
        .service(update)
        .service(remove)
}
