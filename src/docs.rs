use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::{
    PageQuery,
    dashboard::{AdminDashboardResponse, EmployeeDashboardResponse},
    document::{
        DocumentTypeListResponse, DocumentTypeRequest, DocumentTypeResponse,
        EmployeeDocumentGroupResponse, EmployeeDocumentListResponse, EmployeeDocumentResponse,
    },
    employee::{
        ChangePasswordRequest, EmployeeCreateRequest, EmployeeListResponse, EmployeeRequest,
        EmployeeResponse,
    },
    leave_request::{LeaveListResponse, LeaveRequestCreate, LeaveRequestResponse},
    message::{InternalMessageRequest, InternalMessageResponse, RecipientResponse},
    settings::{AppSettingRequest, AppSettingResponse},
};
use crate::auth::handlers::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::ErrorBody;
use crate::model::{leave_request::LeaveStatus, role::Role};

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Administration API",
        version = "1.0.0",
        description = r#"
## HR Administration Backend

Back office for a small company: employee records, leave, internal mail and documents.

### Key Features
- **Employees**: admin-managed profiles and accounts, self-service profile and photo
- **Leave**: requests with attachments, approval drawing down a per-employee balance
- **Messages**: multi-recipient sends grouped into threads, inbox and sent views
- **Documents**: admin-defined document types, employee uploads, missing mandatory types
- **Settings**: site name, contact details, logo and landing image

### Security
Protected endpoints expect `Authorization: Bearer <token>` from `/api/auth/login`.
Routes under `/api/admin` additionally require the ADMIN role.

### Response Format
- JSON with camelCase field names
- Errors as `{ error, message, timestamp }`
- Paged lists as `{ data, page, per_page, total }`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::logout,

        crate::api::employee::list_employees,
        crate::api::employee::list_employees_paged,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::my_profile,
        crate::api::employee::upsert_my_profile,
        crate::api::employee::change_password,
        crate::api::employee::upload_photo,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::leave_list_paged,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::message::send_message,
        crate::api::message::recipients,
        crate::api::message::inbox,
        crate::api::message::sent,
        crate::api::message::unread_count,
        crate::api::message::thread_by_message,
        crate::api::message::thread_by_thread,
        crate::api::message::get_message,
        crate::api::message::mark_read,
        crate::api::message::delete_message,

        crate::api::document::list_types,
        crate::api::document::list_types_paged,
        crate::api::document::get_type,
        crate::api::document::create_type,
        crate::api::document::update_type,
        crate::api::document::delete_type,
        crate::api::document::grouped_uploads,
        crate::api::document::employee_types,
        crate::api::document::my_documents,
        crate::api::document::upload_document,
        crate::api::document::delete_document,

        crate::api::settings::public_settings,
        crate::api::settings::get_settings,
        crate::api::settings::update_settings,
        crate::api::settings::upload_logo,
        crate::api::settings::upload_landing_image,

        crate::api::dashboard::admin_dashboard,
        crate::api::dashboard::employee_dashboard,

        crate::api::files::serve_file
    ),
    components(
        schemas(
            ErrorBody,
            Role,
            LeaveStatus,
            PageQuery,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            EmployeeCreateRequest,
            EmployeeRequest,
            ChangePasswordRequest,
            EmployeeResponse,
            EmployeeListResponse,
            LeaveRequestCreate,
            LeaveRequestResponse,
            LeaveListResponse,
            InternalMessageRequest,
            InternalMessageResponse,
            RecipientResponse,
            DocumentTypeRequest,
            DocumentTypeResponse,
            DocumentTypeListResponse,
            EmployeeDocumentResponse,
            EmployeeDocumentListResponse,
            EmployeeDocumentGroupResponse,
            AppSettingRequest,
            AppSettingResponse,
            AdminDashboardResponse,
            EmployeeDashboardResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and logout"),
        (name = "Employee", description = "Employee management APIs (admin)"),
        (name = "Profile", description = "Self-service profile APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Message", description = "Internal messaging APIs"),
        (name = "Document", description = "Document types and uploads"),
        (name = "Settings", description = "Site settings"),
        (name = "Dashboard", description = "Summary counters"),
        (name = "Files", description = "Stored uploads"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_protected_paths_and_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/employee/messages/inbox"));
        assert!(doc.paths.paths.contains_key("/api/admin/leaves/{id}/approve"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ErrorBody"));
    }
}
