//! Persistence seam. Services open a unit of work with [`Store::begin`], run their
//! reads and writes through it, and [`Tx::commit`] at the end. Dropping a unit of work
//! without committing discards every write made through it.
#![allow(async_fn_in_trait)]

#[cfg(test)]
pub mod memory;
pub mod mysql;

use crate::error::AppResult;
use crate::model::{
    document::{DocumentType, DocumentTypeInput, EmployeeDocument, NewEmployeeDocument},
    employee::{Employee, NewEmployee},
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
    message::{InternalMessage, NewMessage},
    setting::AppSetting,
    user::{NewUser, UserAccount},
};

pub trait Store {
    type Tx: Tx;

    async fn begin(&self) -> AppResult<Self::Tx>;
}

pub trait Tx:
    UserRepo + EmployeeRepo + LeaveRepo + MessageRepo + DocumentRepo + SettingRepo
{
    async fn commit(self) -> AppResult<()>;
}

pub trait UserRepo {
    async fn find_user(&mut self, id: u64) -> AppResult<Option<UserAccount>>;
    /// `email` must already be normalized.
    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<UserAccount>>;
    async fn insert_user(&mut self, user: NewUser) -> AppResult<UserAccount>;
    async fn update_password(&mut self, user_id: u64, password_hash: &str) -> AppResult<()>;
    async fn delete_user(&mut self, id: u64) -> AppResult<()>;
}

pub trait EmployeeRepo {
    async fn find_employee(&mut self, id: u64) -> AppResult<Option<Employee>>;
    /// Same as [`EmployeeRepo::find_employee`] but holds a row lock until commit.
    async fn lock_employee(&mut self, id: u64) -> AppResult<Option<Employee>>;
    async fn find_employee_by_user(&mut self, user_id: u64) -> AppResult<Option<Employee>>;
    /// Ordered by full name.
    async fn list_employees(&mut self) -> AppResult<Vec<Employee>>;
    async fn list_employees_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<Employee>>;
    async fn count_employees(&mut self) -> AppResult<i64>;
    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee>;
    /// Persists every mutable column of `employee` and bumps `updated_at`.
    async fn save_employee(&mut self, employee: &Employee) -> AppResult<Employee>;
    async fn delete_employee(&mut self, id: u64) -> AppResult<()>;
}

pub trait LeaveRepo {
    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> AppResult<LeaveRequest>;
    async fn find_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>>;
    /// Same as [`LeaveRepo::find_leave`] but holds a row lock until commit.
    async fn lock_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>>;
    async fn set_leave_status(&mut self, id: u64, status: LeaveStatus) -> AppResult<LeaveRequest>;
    /// Newest first.
    async fn list_leaves_by_employee(&mut self, employee_id: u64) -> AppResult<Vec<LeaveRequest>>;
    /// Newest first.
    async fn list_leaves(&mut self) -> AppResult<Vec<LeaveRequest>>;
    async fn list_leaves_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<LeaveRequest>>;
    async fn count_leaves(&mut self) -> AppResult<i64>;
    async fn count_leaves_by_status(&mut self, status: LeaveStatus) -> AppResult<i64>;
}

pub trait MessageRepo {
    async fn insert_message(&mut self, message: NewMessage) -> AppResult<InternalMessage>;
    async fn set_thread_id(&mut self, id: u64, thread_id: u64) -> AppResult<()>;
    async fn find_message(&mut self, id: u64) -> AppResult<Option<InternalMessage>>;
    /// Threaded messages the employee sent or received, newest first.
    async fn list_messages_for_participant(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<InternalMessage>>;
    /// Newest first.
    async fn list_sent(&mut self, sender_id: u64) -> AppResult<Vec<InternalMessage>>;
    /// Oldest first.
    async fn list_thread(&mut self, thread_id: u64) -> AppResult<Vec<InternalMessage>>;
    async fn thread_has_participant(&mut self, thread_id: u64, employee_id: u64) -> AppResult<bool>;
    async fn mark_read(&mut self, id: u64) -> AppResult<()>;
    async fn delete_message(&mut self, id: u64) -> AppResult<()>;
    async fn count_unread(&mut self, receiver_id: u64) -> AppResult<i64>;
}

pub trait DocumentRepo {
    /// Ordered by name.
    async fn list_document_types(&mut self) -> AppResult<Vec<DocumentType>>;
    async fn list_document_types_page(
        &mut self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<DocumentType>>;
    async fn count_document_types(&mut self) -> AppResult<i64>;
    async fn find_document_type(&mut self, id: u64) -> AppResult<Option<DocumentType>>;
    /// Case-insensitive.
    async fn document_type_name_taken(&mut self, name: &str) -> AppResult<bool>;
    async fn insert_document_type(&mut self, input: DocumentTypeInput) -> AppResult<DocumentType>;
    async fn update_document_type(
        &mut self,
        id: u64,
        input: DocumentTypeInput,
    ) -> AppResult<DocumentType>;
    async fn delete_document_type(&mut self, id: u64) -> AppResult<()>;

    async fn list_documents_for_employee(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<EmployeeDocument>>;
    async fn list_documents_by_type(&mut self, type_id: u64) -> AppResult<Vec<EmployeeDocument>>;
    async fn list_documents(&mut self) -> AppResult<Vec<EmployeeDocument>>;
    async fn count_documents(&mut self) -> AppResult<i64>;
    async fn find_document(&mut self, id: u64) -> AppResult<Option<EmployeeDocument>>;
    async fn find_document_for(
        &mut self,
        employee_id: u64,
        type_id: u64,
    ) -> AppResult<Option<EmployeeDocument>>;
    async fn insert_document(&mut self, doc: NewEmployeeDocument) -> AppResult<EmployeeDocument>;
    async fn delete_document(&mut self, id: u64) -> AppResult<()>;
}

pub trait SettingRepo {
    async fn find_settings(&mut self) -> AppResult<Option<AppSetting>>;
    /// Inserts or overwrites the singleton row.
    async fn save_settings(&mut self, settings: &AppSetting) -> AppResult<AppSetting>;
}
