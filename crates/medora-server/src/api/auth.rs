use actix_web::{HttpResponse, Scope, post, web};
use serde::Deserialize;
use validator::Validate;

use medora_auth::model::{AUTHORIZATION_HEADER, LoginResult, ROLE_ADMIN, TOKEN_PREFIX, USER_NOT_FOUND_MESSAGE};
use medora_auth::service::account::authenticate;
use medora_auth::service::auth::encode_jwt_token;
use medora_common::MedoraError;

use crate::api::model::validate;
use crate::error::ApiResult;
use crate::model::common::{self, AppState};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Verify the credentials and issue a token, optionally demanding a role
pub(crate) async fn login_with(
    data: &AppState,
    form: &LoginData,
    required_role: Option<&str>,
) -> ApiResult {
    validate(form)?;

    let secret_key = data.configuration.token_secret_key();
    if secret_key.is_empty() {
        tracing::error!("token secret key is not configured");
        return Err(MedoraError::InternalError("token secret key is not configured".to_string()).into());
    }

    let authenticated = authenticate(data.identity(), &form.email, &form.password).await?;

    if let Some(role) = required_role
        && !authenticated.roles.iter().any(|r| r == role)
    {
        tracing::info!(email = %authenticated.account.email, role, "login rejected, role missing");
        return Err(MedoraError::AuthError(USER_NOT_FOUND_MESSAGE.to_string()).into());
    }

    let token_ttl = data.configuration.auth_token_expire_seconds();
    let access_token = encode_jwt_token(&authenticated.account.email, &secret_key, token_ttl)
        .map_err(|e| MedoraError::InternalError(format!("failed to sign token: {}", e)))?;

    tracing::info!(email = %authenticated.account.email, "login succeeded");

    let result = LoginResult {
        access_token: access_token.clone(),
        token_ttl,
        email: authenticated.account.email,
        roles: authenticated.roles,
    };

    Ok(HttpResponse::Ok()
        .insert_header((AUTHORIZATION_HEADER, format!("{}{}", TOKEN_PREFIX, access_token)))
        .json(common::Result::success(result)))
}

#[post("/login")]
async fn login(data: web::Data<AppState>, form: web::Json<LoginData>) -> ApiResult {
    login_with(&data, &form, None).await
}

/// Admin console login, same as `/auth/login` but only for administrators
#[post("/login")]
pub(crate) async fn admin_login(data: web::Data<AppState>, form: web::Json<LoginData>) -> ApiResult {
    login_with(&data, &form, Some(ROLE_ADMIN)).await
}

pub fn routes() -> Scope {
    web::scope("/auth").service(login)
}
