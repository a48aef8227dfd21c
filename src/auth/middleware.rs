use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::store::mysql::MySqlStore;
use crate::store::{Store, UserRepo};
use crate::utils::token_blacklist::TokenBlacklist;

/// Pulls the bearer token out of an `Authorization` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    tracing::debug!(path = %req.path(), reason = message, "Rejected unauthenticated request");
    let resp = AppError::Unauthorized(message.to_string()).error_response();
    req.into_response(resp)
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("App config missing".into()))?;
    let blacklist = req
        .app_data::<Data<TokenBlacklist>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Token blacklist missing".into()))?;
    let store = req
        .app_data::<Data<MySqlStore>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Store missing".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);
    let Some(token) = token else {
        return Ok(reject(req, "Missing or malformed Authorization header"));
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return Ok(reject(req, "Invalid or expired token")),
    };

    if blacklist.is_revoked(&token) {
        return Ok(reject(req, "Token has been logged out"));
    }

    // The account may have been deleted or changed role since the token was issued.
    let mut tx = store.begin().await?;
    let account = match tx.find_user(claims.user_id).await? {
        Some(account) => account,
        None => return Ok(reject(req, "Account no longer exists")),
    };
    drop(tx);

    req.extensions_mut().insert(AuthUser {
        user_id: account.id,
        role: account.role,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
