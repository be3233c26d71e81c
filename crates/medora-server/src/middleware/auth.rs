// Authentication middleware for Actix-web
// Decodes the JWT of every request and stores the outcome as an AuthContext

use actix_service::forward_ready;
use actix_utils::future::{Ready, ok};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{Method, header::HeaderMap},
    web::Data,
};
use futures::future::LocalBoxFuture;

use medora_auth::model::{ACCESS_TOKEN, AUTHORIZATION_HEADER, AuthContext, TOKEN_PREFIX};
use medora_auth::service::auth::decode_jwt_token_cached;

use crate::model::common::AppState;

// Authentication middleware transformer
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware { service })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: S,
}

/// Token from the `accessToken` header, else from `Authorization: Bearer <token>`
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header_val) = headers.get(ACCESS_TOKEN)
        && let Ok(s) = header_val.to_str()
    {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    if let Some(header_val) = headers.get(AUTHORIZATION_HEADER)
        && let Ok(s) = header_val.to_str()
        && let Some(token) = s.trim().strip_prefix(TOKEN_PREFIX)
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if Method::OPTIONS != *req.method() {
            let mut auth_context = AuthContext::default();

            if let Some(token) = extract_token(req.headers()) {
                auth_context.token_provided = true;

                if let Some(app_state) = req.app_data::<Data<AppState>>() {
                    let secret_key = app_state.configuration.token_secret_key();
                    match decode_jwt_token_cached(&token, &secret_key) {
                        Ok(token_data) => auth_context.email = token_data.claims.sub,
                        Err(err) => {
                            tracing::debug!(error = %err, "token rejected");
                            auth_context.jwt_error = Some(err);
                        }
                    }
                } else {
                    tracing::error!("AppState not found in request app_data");
                }
            }

            // Always present so the secured! macro can tell "no token" from "no middleware"
            req.extensions_mut().insert(auth_context);
        }

        let res = self.service.call(req);

        Box::pin(async move { res.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::header::{HeaderName, HeaderValue};

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn test_extract_token_bearer() {
        let map = headers(&[("authorization", "Bearer abc.def")]);
        assert_eq!(extract_token(&map), Some("abc.def".to_string()));
    }

    #[test]
    fn test_extract_token_prefers_access_token_header() {
        let map = headers(&[("accesstoken", " one "), ("authorization", "Bearer two")]);
        assert_eq!(extract_token(&map), Some("one".to_string()));
    }

    #[test]
    fn test_extract_token_missing_or_malformed() {
        assert_eq!(extract_token(&headers(&[])), None);
        assert_eq!(
            extract_token(&headers(&[("authorization", "Basic dXNlcg==")])),
            None
        );
        assert_eq!(extract_token(&headers(&[("authorization", "Bearer  ")])), None);
    }
}
