use super::check_len;
use crate::error::{AppError, AppResult};
use crate::model::setting::AppSetting;
use crate::storage::{IMAGE_EXTENSIONS, Storage, Upload, file_url};
use crate::store::{SettingRepo, Store, Tx};

/// Fields an admin may change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub site_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website_base_url: Option<String>,
}

pub fn trim_trailing_slashes(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Turns stored relative paths into public URLs.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
}

impl UrlBuilder {
    pub fn new(website_base_url: Option<&str>, fallback: &str) -> Self {
        let base = website_base_url
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(fallback);
        Self {
            base: trim_trailing_slashes(base),
        }
    }

    pub fn file_url(&self, stored_path: Option<&str>) -> Option<String> {
        file_url(&self.base, stored_path)
    }
}

#[derive(Clone, Copy)]
enum Image {
    Logo,
    Landing,
}

pub struct Settings<'a, S> {
    store: &'a S,
    storage: &'a Storage,
    fallback_base_url: &'a str,
}

impl<'a, S: Store> Settings<'a, S> {
    pub fn new(store: &'a S, storage: &'a Storage, fallback_base_url: &'a str) -> Self {
        Self {
            store,
            storage,
            fallback_base_url,
        }
    }

    pub async fn get_or_create(&self) -> AppResult<AppSetting> {
        let mut tx = self.store.begin().await?;
        let settings = load_or_create(&mut tx).await?;
        tx.commit().await?;
        Ok(settings)
    }

    pub async fn url_builder(&self) -> AppResult<UrlBuilder> {
        let settings = self.get_or_create().await?;
        Ok(UrlBuilder::new(
            settings.website_base_url.as_deref(),
            self.fallback_base_url,
        ))
    }

    pub async fn update(&self, patch: SettingsPatch) -> AppResult<AppSetting> {
        check_len("Site name", patch.site_name.as_deref(), 200)?;
        check_len("Address", patch.address.as_deref(), 255)?;
        check_len("Phone", patch.phone.as_deref(), 50)?;
        check_len("Website base URL", patch.website_base_url.as_deref(), 300)?;

        let mut tx = self.store.begin().await?;
        let mut settings = load_or_create(&mut tx).await?;
        if let Some(site_name) = patch.site_name {
            settings.site_name = Some(site_name);
        }
        if let Some(address) = patch.address {
            settings.address = Some(address);
        }
        if let Some(phone) = patch.phone {
            settings.phone = Some(phone);
        }
        if let Some(url) = patch.website_base_url {
            settings.website_base_url = Some(trim_trailing_slashes(&url));
        }
        let saved = tx.save_settings(&settings).await?;
        tx.commit().await?;
        tracing::info!("Site settings updated");
        Ok(saved)
    }

    pub async fn update_logo(&self, upload: Upload) -> AppResult<AppSetting> {
        self.replace_image(upload, Image::Logo).await
    }

    pub async fn update_landing_image(&self, upload: Upload) -> AppResult<AppSetting> {
        self.replace_image(upload, Image::Landing).await
    }

    async fn replace_image(&self, upload: Upload, which: Image) -> AppResult<AppSetting> {
        upload.require_extension(IMAGE_EXTENSIONS, "Only PNG, JPG, JPEG images allowed")?;
        let category = match which {
            Image::Logo => "logos",
            Image::Landing => "landing",
        };
        let path = self.storage.store(&upload, category).await?;

        let result = async {
            let mut tx = self.store.begin().await?;
            let mut settings = load_or_create(&mut tx).await?;
            let slot = match which {
                Image::Logo => &mut settings.logo_path,
                Image::Landing => &mut settings.landing_hero_image_path,
            };
            let previous = slot.replace(path.clone());
            let saved = tx.save_settings(&settings).await?;
            tx.commit().await?;
            Ok::<_, AppError>((saved, previous))
        }
        .await;

        match result {
            Ok((saved, previous)) => {
                if let Some(old) = previous {
                    self.storage.delete_best_effort(&old).await;
                }
                Ok(saved)
            }
            Err(e) => {
                self.storage.delete_best_effort(&path).await;
                Err(e)
            }
        }
    }
}

async fn load_or_create<T: SettingRepo>(tx: &mut T) -> AppResult<AppSetting> {
    match tx.find_settings().await? {
        Some(settings) => Ok(settings),
        None => tx.save_settings(&AppSetting::empty()).await,
    }
}
