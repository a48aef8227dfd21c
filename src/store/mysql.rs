use chrono::Utc;
use sqlx::{MySql, MySqlPool, Transaction};

use super::{DocumentRepo, EmployeeRepo, LeaveRepo, MessageRepo, SettingRepo, Store, Tx, UserRepo};
use crate::error::{AppError, AppResult};
use crate::model::{
    document::{DocumentType, DocumentTypeInput, EmployeeDocument, NewEmployeeDocument},
    employee::{Employee, NewEmployee},
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    message::{InternalMessage, NewMessage},
    setting::{AppSetting, SETTINGS_ID},
    user::{NewUser, UserAccount},
};

const USER_SELECT: &str = r#"
    SELECT id, email, password_hash, role, created_at
    FROM user_accounts
"#;

const EMPLOYEE_SELECT: &str = r#"
    SELECT e.id, e.user_id, u.email, e.full_name, e.position, e.department, e.phone,
           e.address, e.date_of_birth, e.join_date, e.remaining_leave_days,
           e.profile_photo_path, e.created_at, e.updated_at
    FROM employees e
    LEFT JOIN user_accounts u ON u.id = e.user_id
"#;

const LEAVE_SELECT: &str = r#"
    SELECT lr.id, lr.employee_id, e.full_name AS employee_name, lr.start_date, lr.end_date,
           lr.reason, lr.status, lr.attachment_path, lr.created_at, lr.updated_at
    FROM leave_requests lr
    JOIN employees e ON e.id = lr.employee_id
"#;

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.sender_id, s.full_name AS sender_name, su.email AS sender_email,
           m.receiver_id, r.full_name AS receiver_name, ru.email AS receiver_email,
           m.subject, m.body, m.reply_to_id, m.thread_id, m.attachment_name,
           m.attachment_type, m.attachment_size, m.attachment_path, m.is_read, m.created_at
    FROM internal_messages m
    JOIN employees s ON s.id = m.sender_id
    LEFT JOIN user_accounts su ON su.id = s.user_id
    JOIN employees r ON r.id = m.receiver_id
    LEFT JOIN user_accounts ru ON ru.id = r.user_id
"#;

const DOCUMENT_TYPE_SELECT: &str = r#"
    SELECT id, name, description, mandatory, created_at
    FROM document_types
"#;

const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.employee_id, e.full_name AS employee_name, u.email AS employee_email,
           d.document_type_id, t.name AS document_type_name, d.original_filename,
           d.stored_path, d.content_type, d.size, d.uploaded_at
    FROM employee_documents d
    JOIN employees e ON e.id = d.employee_id
    LEFT JOIN user_accounts u ON u.id = e.user_id
    JOIN document_types t ON t.id = d.document_type_id
"#;

const SETTINGS_SELECT: &str = r#"
    SELECT id, site_name, address, phone, website_base_url, logo_path,
           landing_hero_image_path, updated_at
    FROM app_settings
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// A unit of work backed by a MySQL transaction; rolled back on drop unless committed.
pub struct MySqlTx {
    tx: Transaction<'static, MySql>,
}

impl Store for MySqlStore {
    type Tx = MySqlTx;

    async fn begin(&self) -> AppResult<MySqlTx> {
        Ok(MySqlTx {
            tx: self.pool.begin().await?,
        })
    }
}

impl Tx for MySqlTx {
    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl MySqlTx {
    async fn fetch_employee(&mut self, id: u64) -> AppResult<Employee> {
        self.find_employee(id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee", id))
    }

    async fn fetch_leave(&mut self, id: u64) -> AppResult<LeaveRequest> {
        self.find_leave(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request", id))
    }

    async fn fetch_document_type(&mut self, id: u64) -> AppResult<DocumentType> {
        self.find_document_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Document type", id))
    }
}

impl UserRepo for MySqlTx {
    async fn find_user(&mut self, id: u64) -> AppResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE id = ?");
        Ok(sqlx::query_as::<_, UserAccount>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE email = ?");
        Ok(sqlx::query_as::<_, UserAccount>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<UserAccount> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_accounts (email, password_hash, role, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
            other => other,
        })?;

        let id = result.last_insert_id();
        self.find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn update_password(&mut self, user_id: u64, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE user_accounts SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_user(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM user_accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

impl EmployeeRepo for MySqlTx {
    async fn find_employee(&mut self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn lock_employee(&mut self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ? FOR UPDATE");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn find_employee_by_user(&mut self, user_id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.user_id = ?");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn list_employees(&mut self) -> AppResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} ORDER BY e.full_name ASC, e.id ASC");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_employees_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} ORDER BY e.full_name ASC, e.id ASC LIMIT ? OFFSET ?");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn count_employees(&mut self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee> {
        let now = Utc::now();
        let profile = employee.profile;
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (user_id, full_name, position, department, phone, address, date_of_birth,
                 join_date, remaining_leave_days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.user_id)
        .bind(&profile.full_name)
        .bind(&profile.position)
        .bind(&profile.department)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(profile.date_of_birth)
        .bind(profile.join_date)
        .bind(employee.remaining_leave_days)
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        self.fetch_employee(result.last_insert_id()).await
    }

    async fn save_employee(&mut self, employee: &Employee) -> AppResult<Employee> {
        sqlx::query(
            r#"
            UPDATE employees
            SET full_name = ?, position = ?, department = ?, phone = ?, address = ?,
                date_of_birth = ?, join_date = ?, remaining_leave_days = ?,
                profile_photo_path = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.full_name)
        .bind(&employee.position)
        .bind(&employee.department)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(employee.date_of_birth)
        .bind(employee.join_date)
        .bind(employee.remaining_leave_days)
        .bind(&employee.profile_photo_path)
        .bind(Utc::now())
        .bind(employee.id)
        .execute(&mut *self.tx)
        .await?;

        self.fetch_employee(employee.id).await
    }

    async fn delete_employee(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

impl LeaveRepo for MySqlTx {
    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, reason, status, attachment_path,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(LeaveStatus::Pending)
        .bind(&leave.attachment_path)
        .bind(now)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;

        self.fetch_leave(result.last_insert_id()).await
    }

    async fn find_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("{LEAVE_SELECT} WHERE lr.id = ?");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn lock_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("{LEAVE_SELECT} WHERE lr.id = ? FOR UPDATE");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn set_leave_status(&mut self, id: u64, status: LeaveStatus) -> AppResult<LeaveRequest> {
        sqlx::query("UPDATE leave_requests SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        self.fetch_leave(id).await
    }

    async fn list_leaves_by_employee(&mut self, employee_id: u64) -> AppResult<Vec<LeaveRequest>> {
        let sql =
            format!("{LEAVE_SELECT} WHERE lr.employee_id = ? ORDER BY lr.created_at DESC, lr.id DESC");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_leaves(&mut self) -> AppResult<Vec<LeaveRequest>> {
        let sql = format!("{LEAVE_SELECT} ORDER BY lr.created_at DESC, lr.id DESC");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_leaves_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<LeaveRequest>> {
        let sql = format!("{LEAVE_SELECT} ORDER BY lr.created_at DESC, lr.id DESC LIMIT ? OFFSET ?");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn count_leaves(&mut self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests")
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn count_leaves_by_status(&mut self, status: LeaveStatus) -> AppResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests WHERE status = ?")
                .bind(status)
                .fetch_one(&mut *self.tx)
                .await?,
        )
    }
}

impl MessageRepo for MySqlTx {
    async fn insert_message(&mut self, message: NewMessage) -> AppResult<InternalMessage> {
        let result = sqlx::query(
            r#"
            INSERT INTO internal_messages
                (sender_id, receiver_id, subject, body, reply_to_id, thread_id,
                 attachment_path, attachment_name, attachment_type, attachment_size,
                 is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.reply_to_id)
        .bind(message.thread_id)
        .bind(&message.attachment.path)
        .bind(&message.attachment.name)
        .bind(&message.attachment.content_type)
        .bind(message.attachment.size)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        let id = result.last_insert_id();
        self.find_message(id)
            .await?
            .ok_or_else(|| AppError::not_found("Message", id))
    }

    async fn set_thread_id(&mut self, id: u64, thread_id: u64) -> AppResult<()> {
        sqlx::query("UPDATE internal_messages SET thread_id = ? WHERE id = ?")
            .bind(thread_id)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_message(&mut self, id: u64) -> AppResult<Option<InternalMessage>> {
        let sql = format!("{MESSAGE_SELECT} WHERE m.id = ?");
        Ok(sqlx::query_as::<_, InternalMessage>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn list_messages_for_participant(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<InternalMessage>> {
        let sql = format!(
            "{MESSAGE_SELECT} WHERE (m.sender_id = ? OR m.receiver_id = ?) AND m.thread_id IS NOT NULL \
             ORDER BY m.created_at DESC, m.id DESC"
        );
        Ok(sqlx::query_as::<_, InternalMessage>(&sql)
            .bind(employee_id)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_sent(&mut self, sender_id: u64) -> AppResult<Vec<InternalMessage>> {
        let sql =
            format!("{MESSAGE_SELECT} WHERE m.sender_id = ? ORDER BY m.created_at DESC, m.id DESC");
        Ok(sqlx::query_as::<_, InternalMessage>(&sql)
            .bind(sender_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_thread(&mut self, thread_id: u64) -> AppResult<Vec<InternalMessage>> {
        let sql =
            format!("{MESSAGE_SELECT} WHERE m.thread_id = ? ORDER BY m.created_at ASC, m.id ASC");
        Ok(sqlx::query_as::<_, InternalMessage>(&sql)
            .bind(thread_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn thread_has_participant(&mut self, thread_id: u64, employee_id: u64) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM internal_messages
            WHERE thread_id = ? AND (sender_id = ? OR receiver_id = ?)
            "#,
        )
        .bind(thread_id)
        .bind(employee_id)
        .bind(employee_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count > 0)
    }

    async fn mark_read(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("UPDATE internal_messages SET is_read = TRUE WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_message(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM internal_messages WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn count_unread(&mut self, receiver_id: u64) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM internal_messages WHERE receiver_id = ? AND is_read = FALSE",
        )
        .bind(receiver_id)
        .fetch_one(&mut *self.tx)
        .await?)
    }
}

impl DocumentRepo for MySqlTx {
    async fn list_document_types(&mut self) -> AppResult<Vec<DocumentType>> {
        let sql = format!("{DOCUMENT_TYPE_SELECT} ORDER BY name ASC");
        Ok(sqlx::query_as::<_, DocumentType>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_document_types_page(
        &mut self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<DocumentType>> {
        let sql = format!("{DOCUMENT_TYPE_SELECT} ORDER BY name ASC LIMIT ? OFFSET ?");
        Ok(sqlx::query_as::<_, DocumentType>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn count_document_types(&mut self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM document_types")
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn find_document_type(&mut self, id: u64) -> AppResult<Option<DocumentType>> {
        let sql = format!("{DOCUMENT_TYPE_SELECT} WHERE id = ?");
        Ok(sqlx::query_as::<_, DocumentType>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn document_type_name_taken(&mut self, name: &str) -> AppResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM document_types WHERE LOWER(name) = LOWER(?)",
        )
        .bind(name.trim())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count > 0)
    }

    async fn insert_document_type(&mut self, input: DocumentTypeInput) -> AppResult<DocumentType> {
        let result = sqlx::query(
            r#"
            INSERT INTO document_types (name, description, mandatory, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.mandatory)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        self.fetch_document_type(result.last_insert_id()).await
    }

    async fn update_document_type(
        &mut self,
        id: u64,
        input: DocumentTypeInput,
    ) -> AppResult<DocumentType> {
        sqlx::query("UPDATE document_types SET name = ?, description = ?, mandatory = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.mandatory)
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        self.fetch_document_type(id).await
    }

    async fn delete_document_type(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM document_types WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn list_documents_for_employee(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<EmployeeDocument>> {
        let sql = format!("{DOCUMENT_SELECT} WHERE d.employee_id = ? ORDER BY d.uploaded_at DESC, d.id DESC");
        Ok(sqlx::query_as::<_, EmployeeDocument>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_documents_by_type(&mut self, type_id: u64) -> AppResult<Vec<EmployeeDocument>> {
        let sql = format!("{DOCUMENT_SELECT} WHERE d.document_type_id = ? ORDER BY d.employee_id ASC, d.id ASC");
        Ok(sqlx::query_as::<_, EmployeeDocument>(&sql)
            .bind(type_id)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn list_documents(&mut self) -> AppResult<Vec<EmployeeDocument>> {
        let sql = format!("{DOCUMENT_SELECT} ORDER BY d.employee_id ASC, d.id ASC");
        Ok(sqlx::query_as::<_, EmployeeDocument>(&sql)
            .fetch_all(&mut *self.tx)
            .await?)
    }

    async fn count_documents(&mut self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employee_documents")
            .fetch_one(&mut *self.tx)
            .await?)
    }

    async fn find_document(&mut self, id: u64) -> AppResult<Option<EmployeeDocument>> {
        let sql = format!("{DOCUMENT_SELECT} WHERE d.id = ?");
        Ok(sqlx::query_as::<_, EmployeeDocument>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn find_document_for(
        &mut self,
        employee_id: u64,
        type_id: u64,
    ) -> AppResult<Option<EmployeeDocument>> {
        let sql = format!("{DOCUMENT_SELECT} WHERE d.employee_id = ? AND d.document_type_id = ?");
        Ok(sqlx::query_as::<_, EmployeeDocument>(&sql)
            .bind(employee_id)
            .bind(type_id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn insert_document(&mut self, doc: NewEmployeeDocument) -> AppResult<EmployeeDocument> {
        let result = sqlx::query(
            r#"
            INSERT INTO employee_documents
                (employee_id, document_type_id, original_filename, stored_path, content_type,
                 size, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(doc.employee_id)
        .bind(doc.document_type_id)
        .bind(&doc.original_filename)
        .bind(&doc.stored_path)
        .bind(&doc.content_type)
        .bind(doc.size)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        let id = result.last_insert_id();
        self.find_document(id)
            .await?
            .ok_or_else(|| AppError::not_found("Document", id))
    }

    async fn delete_document(&mut self, id: u64) -> AppResult<()> {
        sqlx::query("DELETE FROM employee_documents WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }
}

impl SettingRepo for MySqlTx {
    async fn find_settings(&mut self) -> AppResult<Option<AppSetting>> {
        let sql = format!("{SETTINGS_SELECT} WHERE id = ?");
        Ok(sqlx::query_as::<_, AppSetting>(&sql)
            .bind(SETTINGS_ID)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn save_settings(&mut self, settings: &AppSetting) -> AppResult<AppSetting> {
        sqlx::query(
            r#"
            INSERT INTO app_settings
                (id, site_name, address, phone, website_base_url, logo_path,
                 landing_hero_image_path, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                site_name = VALUES(site_name),
                address = VALUES(address),
                phone = VALUES(phone),
                website_base_url = VALUES(website_base_url),
                logo_path = VALUES(logo_path),
                landing_hero_image_path = VALUES(landing_hero_image_path),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(SETTINGS_ID)
        .bind(&settings.site_name)
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(&settings.website_base_url)
        .bind(&settings.logo_path)
        .bind(&settings.landing_hero_image_path)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        self.find_settings()
            .await?
            .ok_or_else(|| AppError::Internal("Settings row missing after save".into()))
    }
}
