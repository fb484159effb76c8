//! Request gate for protected routes.
//!
//! Stage 1 (`validator`) runs inside `HttpAuthentication::bearer`: a missing or
//! malformed `Authorization` header is rejected by the extractor, a bad token by
//! us. Stage 2 (`require_admin`) checks the role of the attached [`AuthContext`].
//! Both stages fail closed with 401 and never reach the handler.

use crate::auth::TokenCodec;
use crate::error::ApiError;
use crate::models::{Claims, Role};
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use std::future::{ready, Ready};
use tracing::{debug, warn};

/// Claims of the caller, attached to the request once its token verifies.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl FromRequest for AuthContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthContext>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}

pub async fn validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(codec) = req.app_data::<web::Data<TokenCodec>>().cloned() else {
        let err = ApiError::Internal("token codec not registered".to_string());
        return Err((err.into(), req));
    };

    match codec.verify(credentials.token()) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthContext { claims });
            Ok(req)
        }
        Err(e) => {
            // the cause stays in the logs; callers get a uniform 401
            debug!("Rejected token on {}: {}", req.path(), e);
            Err((ApiError::Unauthorized.into(), req))
        }
    }
}

pub async fn require_admin<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let role = req
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.claims.role);

    match role {
        Some(Role::Admin) => Ok(next.call(req).await?.map_into_left_body()),
        other => {
            warn!(
                "Denied {} {}: role {:?}",
                req.method(),
                req.path(),
                other.map(|r| r.as_str())
            );
            Ok(req
                .error_response(ApiError::Unauthorized)
                .map_into_right_body())
        }
    }
}
