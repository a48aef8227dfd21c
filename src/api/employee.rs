use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{PageQuery, urls};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::{employee::{Employee, Profile}, role::Role};
use crate::services::employee::{Directory, NewEmployeeAccount};
use crate::services::settings::UrlBuilder;
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;
use crate::utils::email_index::EmailIndex;
use crate::utils::multipart::FormParts;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreateRequest {
    #[schema(example = "rina@company.com", format = "email")]
    pub email: String,
    #[schema(example = "s3cretPass")]
    pub password: String,
    /// Defaults to EMPLOYEE.
    pub role: Option<Role>,
    #[schema(example = "Rina Putri")]
    pub full_name: String,
    #[schema(example = "Engineer")]
    pub position: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "1994-05-12", format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "2024-01-02", format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
    #[schema(example = 12)]
    pub remaining_leave_days: Option<i32>,
}

/// Profile fields. `remainingLeaveDays` is honoured on the admin path only.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    #[schema(example = "Rina Putri")]
    pub full_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "1994-05-12", format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "2024-01-02", format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
    pub remaining_leave_days: Option<i32>,
}

impl EmployeeRequest {
    fn profile(&self) -> Profile {
        Profile {
            full_name: self.full_name.clone(),
            position: self.position.clone(),
            department: self.department.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            date_of_birth: self.date_of_birth,
            join_date: self.join_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[schema(example = "n3wSecretPass")]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "rina@company.com")]
    pub email: Option<String>,
    #[schema(example = "Rina Putri")]
    pub full_name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
    #[schema(example = 12)]
    pub remaining_leave_days: Option<i32>,
    pub profile_photo_path: Option<String>,
    pub profile_photo_url: Option<String>,
}

impl EmployeeResponse {
    pub fn from_model(employee: Employee, urls: &UrlBuilder) -> Self {
        Self {
            profile_photo_url: urls.file_url(employee.profile_photo_path.as_deref()),
            id: employee.id,
            email: employee.email,
            full_name: employee.full_name,
            position: employee.position,
            department: employee.department,
            phone: employee.phone,
            address: employee.address,
            date_of_birth: employee.date_of_birth,
            join_date: employee.join_date,
            remaining_leave_days: employee.remaining_leave_days,
            profile_photo_path: employee.profile_photo_path,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<EmployeeResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 42)]
    pub total: i64,
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/admin/employees",
    responses(
        (status = 200, description = "All employees ordered by name", body = [EmployeeResponse]),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let employees = Directory::new(store.get_ref(), storage.get_ref()).list().await?;
    let urls = urls(&store, &storage, &config).await?;
    let body: Vec<_> = employees
        .into_iter()
        .map(|e| EmployeeResponse::from_model(e, &urls))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// List employees, one page at a time
#[utoipa::path(
    get,
    path = "/api/admin/employees/paged",
    params(PageQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Admin only", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees_paged(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let page = Directory::new(store.get_ref(), storage.get_ref())
        .list_paged(query.paging())
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    let page = page.map(|e| EmployeeResponse::from_model(e, &urls));
    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: page.items,
        page: page.paging.page,
        per_page: page.paging.per_page,
        total: page.total,
    }))
}

/// Get one employee
#[utoipa::path(
    get,
    path = "/api/admin/employees/{id}",
    params(("id", Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .get(path.into_inner())
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from_model(employee, &urls)))
}

/// Create an account together with its employee profile
#[utoipa::path(
    post,
    path = "/api/admin/employees",
    request_body = EmployeeCreateRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    emails: web::Data<EmailIndex>,
    payload: web::Json<EmployeeCreateRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let req = payload.into_inner();
    let input = NewEmployeeAccount {
        email: req.email,
        password: req.password,
        role: req.role,
        profile: Profile {
            full_name: req.full_name,
            position: req.position,
            department: req.department,
            phone: req.phone,
            address: req.address,
            date_of_birth: req.date_of_birth,
            join_date: req.join_date,
        },
        remaining_leave_days: req.remaining_leave_days,
    };
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .create(input, emails.get_ref())
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Created().json(EmployeeResponse::from_model(employee, &urls)))
}

/// Update an employee profile
#[utoipa::path(
    put,
    path = "/api/admin/employees/{id}",
    params(("id", Path, description = "Employee id")),
    request_body = EmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .update(path.into_inner(), payload.profile(), payload.remaining_leave_days)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from_model(employee, &urls)))
}

/// Delete an employee and its account
#[utoipa::path(
    delete,
    path = "/api/admin/employees/{id}",
    params(("id", Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    emails: web::Data<EmailIndex>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    Directory::new(store.get_ref(), storage.get_ref())
        .delete(path.into_inner(), emails.get_ref())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Own profile
#[utoipa::path(
    get,
    path = "/api/employee/profile",
    responses(
        (status = 200, description = "Caller's profile", body = EmployeeResponse),
        (status = 404, description = "No profile yet", body = ErrorBody)
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn my_profile(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .ensure_profile(&auth)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from_model(employee, &urls)))
}

/// Create or update own profile
#[utoipa::path(
    put,
    path = "/api/employee/profile",
    request_body = EmployeeRequest,
    responses(
        (status = 200, description = "Profile saved", body = EmployeeResponse),
        (status = 400, description = "Invalid input", body = ErrorBody)
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn upsert_my_profile(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: web::Json<EmployeeRequest>,
) -> Result<HttpResponse, AppError> {
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .upsert_self(&auth, payload.profile())
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from_model(employee, &urls)))
}

/// Change own password
#[utoipa::path(
    put,
    path = "/api/employee/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = Object, example = json!({
            "message": "Password updated"
        })),
        (status = 400, description = "Password must be 8-72 characters", body = ErrorBody)
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    Directory::new(store.get_ref(), storage.get_ref())
        .change_password(&auth, &payload.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}

/// Upload own profile photo (multipart part `file`, png/jpg/jpeg)
#[utoipa::path(
    post,
    path = "/api/employee/profile/photo",
    request_body(content = String, content_type = "multipart/form-data", description = "Part `file`: the image"),
    responses(
        (status = 200, description = "Photo stored", body = EmployeeResponse),
        (status = 400, description = "Missing or unsupported file", body = ErrorBody)
    ),
    tag = "Profile",
    security(("bearer_auth" = []))
)]
pub async fn upload_photo(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let file = form.file(&["file", "photo"]).unwrap_or_default();
    let employee = Directory::new(store.get_ref(), storage.get_ref())
        .upload_profile_photo(&auth, file)
        .await?;
    let urls = urls(&store, &storage, &config).await?;
    Ok(HttpResponse::Ok().json(EmployeeResponse::from_model(employee, &urls)))
}
