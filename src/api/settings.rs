use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::setting::AppSetting;
use crate::services::settings::{Settings, SettingsPatch, UrlBuilder};
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;
use crate::utils::multipart::FormParts;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingRequest {
    #[schema(example = "PT Maju Jaya")]
    pub site_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "https://hr.example.com")]
    pub website_base_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingResponse {
    pub site_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website_base_url: Option<String>,
    pub logo_path: Option<String>,
    pub logo_url: Option<String>,
    pub landing_hero_image_path: Option<String>,
    pub landing_hero_image_url: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl AppSettingResponse {
    pub fn from_model(settings: AppSetting, fallback_base_url: &str) -> Self {
        let urls = UrlBuilder::new(settings.website_base_url.as_deref(), fallback_base_url);
        Self {
            logo_url: urls.file_url(settings.logo_path.as_deref()),
            landing_hero_image_url: urls.file_url(settings.landing_hero_image_path.as_deref()),
            site_name: settings.site_name,
            address: settings.address,
            phone: settings.phone,
            website_base_url: settings.website_base_url,
            logo_path: settings.logo_path,
            landing_hero_image_path: settings.landing_hero_image_path,
            updated_at: settings.updated_at,
        }
    }
}

/// Site settings, readable without authentication
#[utoipa::path(
    get,
    path = "/api/public/settings",
    responses((status = 200, description = "Current site settings", body = AppSettingResponse)),
    tag = "Settings"
)]
pub async fn public_settings(
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let settings = Settings::new(store.get_ref(), storage.get_ref(), &config.fallback_base_url)
        .get_or_create()
        .await?;
    Ok(HttpResponse::Ok().json(AppSettingResponse::from_model(settings, &config.fallback_base_url)))
}

/// Site settings (admin view)
#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Current site settings", body = AppSettingResponse),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn get_settings(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    public_settings(store, storage, config).await
}

/// Update the given settings fields
#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = AppSettingRequest,
    responses(
        (status = 200, description = "Saved", body = AppSettingResponse),
        (status = 400, description = "Field too long", body = ErrorBody)
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: web::Json<AppSettingRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let req = payload.into_inner();
    let saved = Settings::new(store.get_ref(), storage.get_ref(), &config.fallback_base_url)
        .update(SettingsPatch {
            site_name: req.site_name,
            address: req.address,
            phone: req.phone,
            website_base_url: req.website_base_url,
        })
        .await?;
    Ok(HttpResponse::Ok().json(AppSettingResponse::from_model(saved, &config.fallback_base_url)))
}

/// Replace the site logo (multipart part `file`, png/jpg/jpeg)
#[utoipa::path(
    post,
    path = "/api/admin/settings/logo",
    request_body(content = String, content_type = "multipart/form-data", description = "Part `file`: the image"),
    responses(
        (status = 200, description = "Saved", body = AppSettingResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorBody)
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn upload_logo(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let file = form.file(&["file", "logo"]).unwrap_or_default();
    let saved = Settings::new(store.get_ref(), storage.get_ref(), &config.fallback_base_url)
        .update_logo(file)
        .await?;
    Ok(HttpResponse::Ok().json(AppSettingResponse::from_model(saved, &config.fallback_base_url)))
}

/// Replace the landing page hero image (multipart part `file`, png/jpg/jpeg)
#[utoipa::path(
    post,
    path = "/api/admin/settings/landing-image",
    request_body(content = String, content_type = "multipart/form-data", description = "Part `file`: the image"),
    responses(
        (status = 200, description = "Saved", body = AppSettingResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorBody)
    ),
    tag = "Settings",
    security(("bearer_auth" = []))
)]
pub async fn upload_landing_image(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let file = form.file(&["file", "image"]).unwrap_or_default();
    let saved = Settings::new(store.get_ref(), storage.get_ref(), &config.fallback_base_url)
        .update_landing_image(file)
        .await?;
    Ok(HttpResponse::Ok().json(AppSettingResponse::from_model(saved, &config.fallback_base_url)))
}
