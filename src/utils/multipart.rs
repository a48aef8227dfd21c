use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};
use crate::storage::Upload;

/// One field of a multipart body.
#[derive(Debug)]
pub struct Part {
    pub name: String,
    pub upload: Upload,
}

/// A fully buffered multipart body: a JSON `data` part plus optional file parts.
#[derive(Debug, Default)]
pub struct FormParts {
    parts: Vec<Part>,
}

impl FormParts {
    /// Buffers every field, failing once the combined size passes `limit` bytes.
    pub async fn read(mut payload: Multipart, limit: usize) -> AppResult<Self> {
        let mut parts = Vec::new();
        let mut total = 0usize;

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| AppError::validation(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| AppError::validation(format!("Malformed multipart body: {}", e)))?
            {
                total += chunk.len();
                if total > limit {
                    return Err(AppError::validation(format!(
                        "Upload exceeds the maximum size of {} bytes",
                        limit
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            parts.push(Part {
                name,
                upload: Upload {
                    filename,
                    content_type,
                    bytes,
                },
            });
        }

        Ok(Self { parts })
    }

    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Deserializes the named part as JSON; `None` if the part is absent.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> AppResult<Option<T>> {
        let Some(part) = self.parts.iter().find(|p| p.name == name) else {
            return Ok(None);
        };
        serde_json::from_slice(&part.upload.bytes)
            .map(Some)
            .map_err(|e| AppError::validation(format!("Invalid `{}` part: {}", name, e)))
    }

    pub fn require_json<T: DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        self.json(name)?
            .ok_or_else(|| AppError::validation(format!("Missing `{}` part", name)))
    }

    /// First non-empty file among the given field names.
    pub fn file(&self, names: &[&str]) -> Option<Upload> {
        self.parts
            .iter()
            .find(|p| names.contains(&p.name.as_str()) && !p.upload.is_empty())
            .map(|p| p.upload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Data {
        receiver_ids: Vec<u64>,
    }

    fn part(name: &str, filename: Option<&str>, bytes: &[u8]) -> Part {
        Part {
            name: name.to_string(),
            upload: Upload {
                filename: filename.map(str::to_string),
                content_type: None,
                bytes: bytes.to_vec(),
            },
        }
    }

    #[test]
    fn picks_json_and_first_non_empty_file() {
        let form = FormParts::from_parts(vec![
            part("data", None, br#"{"receiverIds":[2,3]}"#),
            part("attachment", Some("empty.txt"), b""),
            part("file", Some("a.pdf"), b"%PDF"),
        ]);

        let data: Data = form.require_json("data").unwrap();
        assert_eq!(data.receiver_ids, vec![2, 3]);

        let file = form.file(&["attachment", "file"]).unwrap();
        assert_eq!(file.filename.as_deref(), Some("a.pdf"));
    }

    #[test]
    fn missing_or_broken_data_is_a_validation_error() {
        let empty = FormParts::default();
        assert!(matches!(
            empty.require_json::<Data>("data"),
            Err(AppError::Validation(_))
        ));

        let broken = FormParts::from_parts(vec![part("data", None, b"{not json")]);
        assert!(matches!(broken.json::<Data>("data"), Err(AppError::Validation(_))));
    }
}
