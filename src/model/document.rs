use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct DocumentType {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub mandatory: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DocumentTypeInput {
    pub name: String,
    pub description: Option<String>,
    pub mandatory: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct EmployeeDocument {
    pub id: u64,
    pub employee_id: u64,
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub document_type_id: u64,
    pub document_type_name: Option<String>,
    pub original_filename: String,
    pub stored_path: String,
    pub content_type: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmployeeDocument {
    pub employee_id: u64,
    pub document_type_id: u64,
    pub original_filename: String,
    pub stored_path: String,
    pub content_type: String,
    pub size: i64,
}
