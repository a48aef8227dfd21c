//! HTTP handlers. Each one resolves the caller, delegates to a service and maps the
//! result into a camelCase response body.
pub mod dashboard;
pub mod document;
pub mod employee;
pub mod files;
pub mod leave_request;
pub mod message;
pub mod settings;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::model::employee::Employee;
use crate::services::{Paging, employee::Directory, settings::{Settings, UrlBuilder}};
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

impl PageQuery {
    pub fn paging(&self) -> Paging {
        Paging::new(self.page, self.per_page)
    }
}

/// URL builder for the current site settings.
pub(crate) async fn urls(
    store: &MySqlStore,
    storage: &Storage,
    config: &Config,
) -> AppResult<UrlBuilder> {
    Settings::new(store, storage, &config.fallback_base_url)
        .url_builder()
        .await
}

/// The caller's employee profile, provisioned on first use for admins.
pub(crate) async fn current_employee(
    store: &MySqlStore,
    storage: &Storage,
    user: &AuthUser,
) -> AppResult<Employee> {
    Directory::new(store, storage).ensure_profile(user).await
}
