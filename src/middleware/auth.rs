use crate::services::auth_service::{self, Claims};
use crate::utils::error::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

/// Bearer-token gate for protected scopes. Verification happens before any
/// handler logic runs; on success the decoded claims are stored in the
/// request extensions for handlers to pick up.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let token = match header {
            Some(value) => {
                // Accept both "Bearer <jwt>" and a raw token value
                value
                    .strip_prefix("Bearer ")
                    .unwrap_or(&value)
                    .trim()
                    .to_string()
            }
            None => {
                log::warn!("❌ {} {} - missing token", req.method(), req.path());
                return Box::pin(async move { Err(unauthorized(AppError::MissingToken)) });
            }
        };

        if token.is_empty() {
            log::warn!("❌ {} {} - missing token", req.method(), req.path());
            return Box::pin(async move { Err(unauthorized(AppError::MissingToken)) });
        }

        match auth_service::verify_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(e) => {
                log::warn!("❌ {} {} - {}", req.method(), req.path(), e);
                Box::pin(async move { Err(unauthorized(AppError::InvalidToken)) })
            }
        }
    }
}

// 401 with the standard envelope instead of actix's plain-text default
fn unauthorized(err: AppError) -> Error {
    let response = err.to_response();
    InternalError::from_response(err, response).into()
}

/// Claims injected by `AuthMiddleware`. None only if the handler was mounted
/// outside a protected scope.
pub fn authenticated_claims(req: &HttpRequest) -> Option<Claims> {
    req.extensions().get::<Claims>().cloned()
}
