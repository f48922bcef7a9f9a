use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};

use crate::domain::auth::Principal;
use crate::domain::ports::Authenticator;
use crate::errors::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Extracts the session token: the `access_token` cookie wins over an
/// `Authorization: Bearer` header.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn authenticate(req: &HttpRequest) -> Result<Principal, AppError> {
    let authenticator = req
        .app_data::<web::Data<dyn Authenticator>>()
        .ok_or_else(|| AppError::Internal("authenticator is not configured".to_string()))?;
    let token = token_from_request(req)
        .ok_or_else(|| AppError::Unauthenticated("missing access token".to_string()))?;
    Ok(authenticator.authenticate(&token)?)
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
