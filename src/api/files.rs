use actix_web::{HttpResponse, http::header, web};

use crate::error::AppError;
use crate::storage::Storage;

/// Content type sniffed from the leading bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

/// Serve a stored upload
#[utoipa::path(
    get,
    path = "/files/{path}",
    params(("path", Path, description = "Relative path returned in a file URL")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "No such file", body = ErrorBody)
    ),
    tag = "Files"
)]
pub async fn serve_file(
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let relative = path.into_inner();
    let bytes = storage.read(&relative).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, sniff_content_type(&bytes)))
        .insert_header((header::CACHE_CONTROL, "public, max-age=3600"))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_known_formats_and_falls_back() {
        assert_eq!(sniff_content_type(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(
            sniff_content_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/png"
        );
        assert_eq!(sniff_content_type(b"plain words"), "application/octet-stream");
    }
}
