// Security context and authorization macro for API access control

use actix_web::{HttpRequest, web};

use crate::model::app_state::AppState;

// Referenced via $crate::secured:: in the macro expansion
pub use medora_auth::model::AuthContext;
pub use medora_auth::service::account::resolve_roles;

/// Roles a handler accepts. An empty list admits any authenticated account.
#[derive(Debug, Clone)]
pub struct Secured<'a> {
    pub req: &'a HttpRequest,
    pub data: &'a web::Data<AppState>,
    pub roles: Vec<&'static str>,
}

impl<'a> Secured<'a> {
    pub fn builder(req: &'a HttpRequest, data: &'a web::Data<AppState>) -> SecuredBuilder<'a> {
        SecuredBuilder::new(req, data)
    }

    /// Whether an account holding `held` may pass
    pub fn permits(&self, held: &[String]) -> bool {
        self.roles.is_empty() || held.iter().any(|r| self.roles.contains(&r.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct SecuredBuilder<'a> {
    req: &'a HttpRequest,
    data: &'a web::Data<AppState>,
    roles: Vec<&'static str>,
}

impl<'a> SecuredBuilder<'a> {
    pub fn new(req: &'a HttpRequest, data: &'a web::Data<AppState>) -> Self {
        SecuredBuilder::<'a> {
            req,
            data,
            roles: Vec::new(),
        }
    }

    pub fn role(mut self, role: &'static str) -> Self {
        self.roles.push(role);
        self
    }

    pub fn roles(mut self, roles: &[&'static str]) -> Self {
        self.roles.extend_from_slice(roles);
        self
    }

    pub fn build(self) -> Secured<'a> {
        Secured::<'a> {
            req: self.req,
            data: self.data,
            roles: self.roles,
        }
    }
}

/// Returns early from the handler with 401 or 403 unless the caller passes.
///
/// Roles are looked up in the identity store on every call, so a deleted
/// account loses access even while its token is still valid.
#[macro_export]
macro_rules! secured {
    ($secured: expr) => {
        let __secured = $secured;

        if __secured.data.configuration.auth_enabled() {
            let __auth_context_opt: Option<$crate::secured::AuthContext> = {
                actix_web::HttpMessage::extensions(__secured.req)
                    .get::<$crate::secured::AuthContext>()
                    .cloned()
            };

            match __auth_context_opt {
                None => {
                    return Ok($crate::model::response::ErrorResult::http_response_unauthorized(
                        "no auth context found",
                        __secured.req.path(),
                    ));
                }
                Some(ref __auth_context) if !__auth_context.token_provided => {
                    return Ok($crate::model::response::ErrorResult::http_response_unauthorized(
                        "no token provided",
                        __secured.req.path(),
                    ));
                }
                Some(ref __auth_context) if __auth_context.jwt_error.is_some() => {
                    return Ok($crate::model::response::ErrorResult::http_response_unauthorized(
                        &__auth_context.jwt_error_string(),
                        __secured.req.path(),
                    ));
                }
                Some(ref __auth_context) => {
                    let __roles = $crate::secured::resolve_roles(
                        __secured.data.identity(),
                        &__auth_context.email,
                    )
                    .await
                    .ok()
                    .unwrap_or_default();

                    if __roles.is_empty() {
                        return Ok($crate::model::response::ErrorResult::http_response_unauthorized(
                            "no roles found for user",
                            __secured.req.path(),
                        ));
                    }

                    if !__secured.permits(&__roles) {
                        tracing::info!(
                            email = %__auth_context.email,
                            path = __secured.req.path(),
                            "authorization failed"
                        );
                        return Ok($crate::model::response::ErrorResult::http_response_forbidden(
                            "authorization failed!.",
                            __secured.req.path(),
                        ));
                    }
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test::TestRequest;

    use medora_common::{ROLE_ADMIN, ROLE_DOCTOR, ROLE_PATIENT};
    use medora_persistence::MemoryPersistService;

    use super::*;
    use crate::model::config::Configuration;

    #[test]
    fn test_permits() {
        let req = TestRequest::default().to_http_request();
        let data = web::Data::new(AppState::new(
            Configuration::default(),
            Arc::new(MemoryPersistService::new()),
        ));

        let admins_or_doctors = Secured::builder(&req, &data)
            .roles(&[ROLE_ADMIN, ROLE_DOCTOR])
            .build();
        assert!(admins_or_doctors.permits(&[ROLE_DOCTOR.to_string()]));
        assert!(!admins_or_doctors.permits(&[ROLE_PATIENT.to_string()]));

        let anyone = Secured::builder(&req, &data).build();
        assert!(anyone.permits(&[ROLE_PATIENT.to_string()]));
    }
}
