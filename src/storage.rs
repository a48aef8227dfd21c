use std::path::{Component, Path, PathBuf};

use url::Url;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A file received from a client, fully buffered.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }

    /// Lower-cased extension of the client filename, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Rejects empty uploads and filenames outside `allowed`.
    pub fn require_extension(&self, allowed: &[&str], message: &str) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::validation("File is required"));
        }
        match self.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
            _ => Err(AppError::validation(message)),
        }
    }
}

/// Upload directory on local disk. Paths handed out and accepted are relative to it and
/// always use `/` separators.
#[derive(Debug, Clone)]
pub struct Storage {
    base_dir: PathBuf,
}

impl Storage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Writes `upload` under `<category>/<uuid><ext>` and returns that relative path.
    pub async fn store(&self, upload: &Upload, category: &str) -> AppResult<String> {
        let dir = self.resolve(category)?;
        tokio::fs::create_dir_all(&dir).await?;

        let filename = match upload.filename.as_deref().and_then(|n| n.rsplit_once('.')) {
            Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                format!("{}.{}", Uuid::new_v4(), ext)
            }
            _ => Uuid::new_v4().to_string(),
        };
        tokio::fs::write(dir.join(&filename), &upload.bytes).await?;

        let relative = format!("{}/{}", category.trim_matches('/'), filename);
        tracing::debug!(path = %relative, size = upload.bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Removes a stored file; failures are logged and swallowed.
    pub async fn delete_best_effort(&self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        let target = match self.resolve(path) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(path, error = %e, "Refusing to delete file outside upload dir");
                return;
            }
        };
        match tokio::fs::remove_file(&target).await {
            Ok(()) => tracing::debug!(path, "Deleted stored file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path, error = %e, "Failed to delete stored file"),
        }
    }

    pub async fn read(&self, path: &str) -> AppResult<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("File not found: {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let normalized = relative.replace('\\', "/");
        let rel = Path::new(&normalized);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || normalized.trim().is_empty() {
            return Err(AppError::NotFound(format!("File not found: {}", relative)));
        }
        Ok(self.base_dir.join(rel))
    }
}

/// Public URL of a stored file, or `None` when there is no file. Each path segment is
/// percent-encoded. A base that is not an absolute URL is kept as a plain prefix.
pub fn file_url(base_url: &str, stored_path: Option<&str>) -> Option<String> {
    let path = stored_path.filter(|p| !p.trim().is_empty())?.replace('\\', "/");
    let base = base_url.trim().trim_end_matches('/');
    let segments = std::iter::once("files").chain(path.split('/'));

    match Url::parse(base) {
        Ok(mut url) if !url.cannot_be_a_base() => {
            url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
            Some(url.into())
        }
        _ => {
            let mut scratch = Url::parse("http://localhost/").ok()?;
            scratch.path_segments_mut().ok()?.clear().extend(segments);
            Some(format!("{}{}", base, scratch.path()))
        }
    }
}
