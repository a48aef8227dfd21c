use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The settings table holds exactly one row.
pub const SETTINGS_ID: u64 = 1;

#[derive(Debug, Clone, FromRow)]
pub struct AppSetting {
    pub id: u64,
    pub site_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website_base_url: Option<String>,
    pub logo_path: Option<String>,
    pub landing_hero_image_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AppSetting {
    pub fn empty() -> Self {
        Self {
            id: SETTINGS_ID,
            site_name: None,
            address: None,
            phone: None,
            website_base_url: None,
            logo_path: None,
            landing_hero_image_path: None,
            updated_at: Utc::now(),
        }
    }
}
