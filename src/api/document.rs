use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{PageQuery, current_employee, urls};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::document::{DocumentType, DocumentTypeInput, EmployeeDocument};
use crate::services::document::{DocumentGroup, Documents};
use crate::services::settings::UrlBuilder;
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;
use crate::utils::multipart::FormParts;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeRequest {
    #[schema(example = "KTP")]
    pub name: String,
    #[schema(example = "National identity card")]
    pub description: Option<String>,
    #[serde(default)]
    pub mandatory: bool,
}

impl From<DocumentTypeRequest> for DocumentTypeInput {
    fn from(req: DocumentTypeRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            mandatory: req.mandatory,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "KTP")]
    pub name: String,
    pub description: Option<String>,
    pub mandatory: bool,
}

impl From<DocumentType> for DocumentTypeResponse {
    fn from(t: DocumentType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            mandatory: t.mandatory,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DocumentTypeListResponse {
    pub data: Vec<DocumentTypeResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 4)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocumentResponse {
    pub id: u64,
    pub document_type_id: u64,
    pub document_type_name: Option<String>,
    pub original_filename: String,
    pub stored_path: String,
    pub file_url: Option<String>,
    pub content_type: String,
    pub size: i64,
    #[schema(format = "date-time", value_type = String)]
    pub uploaded_at: DateTime<Utc>,
}

impl EmployeeDocumentResponse {
    pub fn from_model(doc: EmployeeDocument, urls: &UrlBuilder) -> Self {
        Self {
            file_url: urls.file_url(Some(&doc.stored_path)),
            id: doc.id,
            document_type_id: doc.document_type_id,
            document_type_name: doc.document_type_name,
            original_filename: doc.original_filename,
            stored_path: doc.stored_path,
            content_type: doc.content_type,
            size: doc.size,
            uploaded_at: doc.uploaded_at,
        }
    }
}

fn to_responses(docs: Vec<EmployeeDocument>, urls: &UrlBuilder) -> Vec<EmployeeDocumentResponse> {
    docs.into_iter()
        .map(|d| EmployeeDocumentResponse::from_model(d, urls))
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocumentListResponse {
    pub documents: Vec<EmployeeDocumentResponse>,
    pub missing_mandatory: Vec<DocumentTypeResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocumentGroupResponse {
    pub employee_id: u64,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub documents: Vec<EmployeeDocumentResponse>,
}

impl EmployeeDocumentGroupResponse {
    fn from_group(group: DocumentGroup, urls: &UrlBuilder) -> Self {
        Self {
            employee_id: group.employee_id,
            employee_name: group.employee_name,
            employee_email: group.employee_email,
            documents: to_responses(group.documents, urls),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct UploadsFilter {
    /// Only uploads of this document type
    pub type_id: Option<u64>,
}

/// List document types
#[utoipa::path(
    get,
    path = "/api/admin/document-types",
    responses((status = 200, description = "All document types by name", body = [DocumentTypeResponse])),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn list_types(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let types = Documents::new(store.get_ref(), storage.get_ref()).list_types().await?;
    let body: Vec<DocumentTypeResponse> = types.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// List document types, one page at a time
#[utoipa::path(
    get,
    path = "/api/admin/document-types/paged",
    params(PageQuery),
    responses((status = 200, description = "Paginated document types", body = DocumentTypeListResponse)),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn list_types_paged(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let page = Documents::new(store.get_ref(), storage.get_ref())
        .list_types_paged(query.paging())
        .await?
        .map(DocumentTypeResponse::from);
    Ok(HttpResponse::Ok().json(DocumentTypeListResponse {
        data: page.items,
        page: page.paging.page,
        per_page: page.paging.per_page,
        total: page.total,
    }))
}

/// Get one document type
#[utoipa::path(
    get,
    path = "/api/admin/document-types/{id}",
    params(("id", Path, description = "Document type id")),
    responses(
        (status = 200, description = "Document type", body = DocumentTypeResponse),
        (status = 404, description = "Not found", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn get_type(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let t = Documents::new(store.get_ref(), storage.get_ref())
        .get_type(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(DocumentTypeResponse::from(t)))
}

/// Create a document type
#[utoipa::path(
    post,
    path = "/api/admin/document-types",
    request_body = DocumentTypeRequest,
    responses(
        (status = 201, description = "Created", body = DocumentTypeResponse),
        (status = 409, description = "Name already exists", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn create_type(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    payload: web::Json<DocumentTypeRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let t = Documents::new(store.get_ref(), storage.get_ref())
        .create_type(payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(DocumentTypeResponse::from(t)))
}

/// Update a document type
#[utoipa::path(
    put,
    path = "/api/admin/document-types/{id}",
    params(("id", Path, description = "Document type id")),
    request_body = DocumentTypeRequest,
    responses(
        (status = 200, description = "Updated", body = DocumentTypeResponse),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Name already exists", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn update_type(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    path: web::Path<u64>,
    payload: web::Json<DocumentTypeRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let t = Documents::new(store.get_ref(), storage.get_ref())
        .update_type(path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(DocumentTypeResponse::from(t)))
}

/// Delete a document type together with its uploads
#[utoipa::path(
    delete,
    path = "/api/admin/document-types/{id}",
    params(("id", Path, description = "Document type id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn delete_type(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    Documents::new(store.get_ref(), storage.get_ref())
        .delete_type(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Uploads grouped by employee
#[utoipa::path(
    get,
    path = "/api/admin/documents/uploads",
    params(UploadsFilter),
    responses(
        (status = 200, description = "Groups in ascending employee id", body = [EmployeeDocumentGroupResponse]),
        (status = 404, description = "Unknown document type", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn grouped_uploads(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    query: web::Query<UploadsFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let groups = Documents::new(store.get_ref(), storage.get_ref())
        .grouped_uploads(query.type_id)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    let body: Vec<_> = groups
        .into_iter()
        .map(|g| EmployeeDocumentGroupResponse::from_group(g, &urls))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Document types visible to employees
#[utoipa::path(
    get,
    path = "/api/employee/documents/types",
    responses((status = 200, description = "All document types", body = [DocumentTypeResponse])),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn employee_types(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let types = Documents::new(store.get_ref(), storage.get_ref()).list_types().await?;
    let body: Vec<DocumentTypeResponse> = types.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Own documents plus mandatory types still missing
#[utoipa::path(
    get,
    path = "/api/employee/documents",
    responses((status = 200, description = "Own documents", body = EmployeeDocumentListResponse)),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn my_documents(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    let listing = Documents::new(store.get_ref(), storage.get_ref())
        .list_for_employee(&employee)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeDocumentListResponse {
        documents: to_responses(listing.documents, &urls),
        missing_mandatory: listing.missing_mandatory.into_iter().map(Into::into).collect(),
    }))
}

/// Upload (or replace) the document for a type
#[utoipa::path(
    post,
    path = "/api/employee/documents/{typeId}/upload",
    params(("typeId", Path, description = "Document type id")),
    request_body(content = String, content_type = "multipart/form-data", description = "Part `file`: pdf, jpg, jpeg or png"),
    responses(
        (status = 201, description = "Stored", body = EmployeeDocumentResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorBody),
        (status = 404, description = "Unknown document type", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let file = form.file(&["file", "attachment"]).unwrap_or_default();

    let employee = current_employee(&store, &storage, &auth).await?;
    let doc = Documents::new(store.get_ref(), storage.get_ref())
        .upload(&employee, path.into_inner(), file)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Created().json(EmployeeDocumentResponse::from_model(doc, &urls)))
}

/// Delete one of the caller's documents
#[utoipa::path(
    delete,
    path = "/api/employee/documents/{id}",
    params(("id", Path, description = "Document id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Document belongs to someone else", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    ),
    tag = "Document",
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    Documents::new(store.get_ref(), storage.get_ref())
        .delete_own(&employee, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mandatory_defaults_to_false() {
        let req: DocumentTypeRequest = serde_json::from_value(json!({ "name": "KTP" })).unwrap();
        let input = DocumentTypeInput::from(req);
        assert_eq!(input.name, "KTP");
        assert!(!input.mandatory);
    }

    #[test]
    fn document_response_links_stored_file() {
        let doc = EmployeeDocument {
            id: 3,
            employee_id: 1,
            employee_name: Some("Ana".into()),
            employee_email: None,
            document_type_id: 2,
            document_type_name: Some("KTP".into()),
            original_filename: "ktp.pdf".into(),
            stored_path: "employee-docs/1/abc.pdf".into(),
            content_type: "application/pdf".into(),
            size: 4,
            uploaded_at: Utc::now(),
        };
        let urls = UrlBuilder::new(Some("https://hr.test/"), "http://unused");
        let body = serde_json::to_value(EmployeeDocumentResponse::from_model(doc, &urls)).unwrap();
        assert_eq!(body["documentTypeName"], "KTP");
        assert_eq!(body["fileUrl"], "https://hr.test/files/employee-docs/1/abc.pdf");
    }
}
