use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::auth::middleware::bearer_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::services::auth::{Accounts, IssuedToken};
use crate::store::mysql::MySqlStore;
use crate::utils::email_index::EmailIndex;
use crate::utils::token_blacklist::TokenBlacklist;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "rina@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cretPass")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "rina@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cretPass")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub access_token: String,
    #[schema(example = "rina@company.com")]
    pub email: String,
    pub role: Role,
}

impl From<IssuedToken> for AuthResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            access_token: token.access_token,
            email: token.email,
            role: token.role,
        }
    }
}

/// Self sign-up as an EMPLOYEE
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered and signed in", body = AuthResponse),
        (status = 400, description = "Invalid email or password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterRequest>,
    store: web::Data<MySqlStore>,
    emails: web::Data<EmailIndex>,
    blacklist: web::Data<TokenBlacklist>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let token = Accounts::new(store.get_ref(), emails.get_ref(), blacklist.get_ref(), config.get_ref())
        .register(&payload.email, &payload.password)
        .await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(token)))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(payload, store, emails, blacklist, config),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginRequest>,
    store: web::Data<MySqlStore>,
    emails: web::Data<EmailIndex>,
    blacklist: web::Data<TokenBlacklist>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    tracing::info!("Login request received");
    let token = Accounts::new(store.get_ref(), emails.get_ref(), blacklist.get_ref(), config.get_ref())
        .login(&payload.email, &payload.password)
        .await?;
    Ok(HttpResponse::Ok().json(AuthResponse::from(token)))
}

/// Invalidate the presented bearer token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Token invalidated (always succeeds)")),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<MySqlStore>,
    emails: web::Data<EmailIndex>,
    blacklist: web::Data<TokenBlacklist>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    if let Some(token) = token {
        Accounts::new(store.get_ref(), emails.get_ref(), blacklist.get_ref(), config.get_ref())
            .logout(token)
            .await;
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_shape() {
        let body = serde_json::to_value(AuthResponse::from(IssuedToken {
            access_token: "abc".into(),
            email: "rina@corp.test".into(),
            role: Role::Employee,
        }))
        .unwrap();
        assert_eq!(body["tokenType"], "Bearer");
        assert_eq!(body["accessToken"], "abc");
        assert_eq!(body["role"], "EMPLOYEE");
    }
}
