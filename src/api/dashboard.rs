use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::leave_request::LeaveRequestResponse;
use super::{current_employee, urls};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::services::dashboard::{AdminSummary, Dashboard};
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardResponse {
    pub total_employees: i64,
    pub total_document_types: i64,
    pub uploaded_documents: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub rejected_leaves: i64,
    pub employees_with_complete_docs: i64,
    pub employees_with_incomplete_docs: i64,
    #[schema(example = json!({ "Engineer": 4, "HR": 1 }))]
    pub position_distribution: BTreeMap<String, i64>,
    pub documents_need_review: i64,
}

impl From<AdminSummary> for AdminDashboardResponse {
    fn from(s: AdminSummary) -> Self {
        Self {
            total_employees: s.total_employees,
            total_document_types: s.total_document_types,
            uploaded_documents: s.uploaded_documents,
            pending_leaves: s.pending_leaves,
            approved_leaves: s.approved_leaves,
            rejected_leaves: s.rejected_leaves,
            employees_with_complete_docs: s.employees_with_complete_docs,
            employees_with_incomplete_docs: s.employees_with_incomplete_docs,
            position_distribution: s.position_distribution,
            documents_need_review: s.documents_need_review,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDashboardResponse {
    pub employee_id: u64,
    pub total_document_types: i64,
    pub uploaded_documents: i64,
    pub mandatory_docs_uploaded: i64,
    pub mandatory_docs_missing: i64,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub latest_leave_request: Option<LeaveRequestResponse>,
}

/// Organisation-wide counters
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardResponse),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn admin_dashboard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let summary = Dashboard::new(store.get_ref()).admin().await?;
    Ok(HttpResponse::Ok().json(AdminDashboardResponse::from(summary)))
}

/// The caller's own counters
#[utoipa::path(
    get,
    path = "/api/employee/dashboard",
    responses((status = 200, description = "Employee dashboard", body = EmployeeDashboardResponse)),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn employee_dashboard(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    let summary = Dashboard::new(store.get_ref()).employee(&employee).await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeDashboardResponse {
        employee_id: summary.employee_id,
        total_document_types: summary.total_document_types,
        uploaded_documents: summary.uploaded_documents,
        mandatory_docs_uploaded: summary.mandatory_docs_uploaded,
        mandatory_docs_missing: summary.mandatory_docs_missing,
        pending_leaves: summary.pending_leaves,
        approved_leaves: summary.approved_leaves,
        latest_leave_request: summary
            .latest_leave_request
            .map(|l| LeaveRequestResponse::from_model(l, &urls)),
    }))
}
