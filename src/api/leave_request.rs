use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PageQuery, current_employee, urls};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::services::leave::{LeaveInput, LeaveLedger};
use crate::services::settings::UrlBuilder;
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;
use crate::utils::multipart::FormParts;

/// The JSON `data` part of a leave submission.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestCreate {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Rina Putri")]
    pub employee_name: Option<String>,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub attachment_path: Option<String>,
    pub attachment_url: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequestResponse {
    pub fn from_model(leave: LeaveRequest, urls: &UrlBuilder) -> Self {
        Self {
            attachment_url: urls.file_url(leave.attachment_path.as_deref()),
            id: leave.id,
            employee_id: leave.employee_id,
            employee_name: leave.employee_name,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason,
            status: leave.status,
            attachment_path: leave.attachment_path,
            created_at: leave.created_at,
            updated_at: leave.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequestResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

fn to_responses(leaves: Vec<LeaveRequest>, urls: &UrlBuilder) -> Vec<LeaveRequestResponse> {
    leaves
        .into_iter()
        .map(|l| LeaveRequestResponse::from_model(l, urls))
        .collect()
}

/// Submit a leave request
#[utoipa::path(
    post,
    path = "/api/employee/leaves",
    request_body(
        content = LeaveRequestCreate,
        description = "Multipart body: JSON part `data` plus optional file part `attachment`",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 201, description = "Leave request submitted as PENDING", body = LeaveRequestResponse),
        (status = 400, description = "Invalid dates, blank reason or insufficient balance", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let data: LeaveRequestCreate = form.require_json("data")?;
    let attachment = form.file(&["attachment", "file"]);

    let employee = current_employee(&store, &storage, &auth).await?;
    let leave = LeaveLedger::new(store.get_ref(), storage.get_ref())
        .create(
            &employee,
            LeaveInput {
                start_date: data.start_date,
                end_date: data.end_date,
                reason: data.reason,
            },
            attachment,
        )
        .await?;

    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Created().json(LeaveRequestResponse::from_model(leave, &urls)))
}

/// Own leave history, newest first
#[utoipa::path(
    get,
    path = "/api/employee/leaves",
    responses(
        (status = 200, description = "Caller's leave requests", body = [LeaveRequestResponse])
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn my_leaves(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    let leaves = LeaveLedger::new(store.get_ref(), storage.get_ref())
        .list_by_employee(employee.id)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(to_responses(leaves, &urls)))
}

/// Every leave request, newest first
#[utoipa::path(
    get,
    path = "/api/admin/leaves",
    responses(
        (status = 200, description = "All leave requests", body = [LeaveRequestResponse]),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let leaves = LeaveLedger::new(store.get_ref(), storage.get_ref())
        .list_all()
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(to_responses(leaves, &urls)))
}

/// Every leave request, one page at a time
#[utoipa::path(
    get,
    path = "/api/admin/leaves/paged",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated leave requests", body = LeaveListResponse),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn leave_list_paged(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let page = LeaveLedger::new(store.get_ref(), storage.get_ref())
        .list_paged(query.paging())
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    let page = page.map(|l| LeaveRequestResponse::from_model(l, &urls));
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page.items,
        page: page.paging.page,
        per_page: page.paging.per_page,
        total: page.total,
    }))
}

async fn set_status(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    id: u64,
    status: LeaveStatus,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let leave = LeaveLedger::new(store.get_ref(), storage.get_ref())
        .update_status(id, status)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(LeaveRequestResponse::from_model(leave, &urls)))
}

/// Approve a leave request
#[utoipa::path(
    put,
    path = "/api/admin/leaves/{id}/approve",
    params(("id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Approved; balance drawn down on first approval", body = LeaveRequestResponse),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    set_status(auth, store, storage, config, path.into_inner(), LeaveStatus::Approved).await
}

/// Reject a leave request
#[utoipa::path(
    put,
    path = "/api/admin/leaves/{id}/reject",
    params(("id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Rejected", body = LeaveRequestResponse),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    set_status(auth, store, storage, config, path.into_inner(), LeaveStatus::Rejected).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_uses_camel_case_and_status_text() {
        let now = Utc::now();
        let leave = LeaveRequest {
            id: 4,
            employee_id: 2,
            employee_name: Some("Rina".into()),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 7).unwrap(),
            reason: "Trip".into(),
            status: LeaveStatus::Pending,
            attachment_path: None,
            created_at: now,
            updated_at: now,
        };
        let urls = UrlBuilder::new(Some("https://hr.test"), "http://unused");
        let body = serde_json::to_value(LeaveRequestResponse::from_model(leave, &urls)).unwrap();
        assert_eq!(body["employeeName"], "Rina");
        assert_eq!(body["startDate"], "2026-01-05");
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["attachmentUrl"], serde_json::Value::Null);
    }

    #[test]
    fn create_payload_tolerates_missing_fields() {
        let data: LeaveRequestCreate =
            serde_json::from_value(json!({ "startDate": "2026-01-05" })).unwrap();
        assert!(data.end_date.is_none());
        assert!(data.reason.is_none());
    }
}
