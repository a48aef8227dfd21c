//! In-process store used by service tests. Mirrors the MySQL schema's constraints
//! (unique keys, cascades, joined columns) closely enough for the services not to notice.
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

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

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    users: BTreeMap<u64, UserAccount>,
    employees: BTreeMap<u64, Employee>,
    leaves: BTreeMap<u64, LeaveRequest>,
    messages: BTreeMap<u64, InternalMessage>,
    document_types: BTreeMap<u64, DocumentType>,
    documents: BTreeMap<u64, EmployeeDocument>,
    settings: Option<AppSetting>,
    last_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn employee(&self, id: u64) -> Option<Employee> {
        let mut employee = self.employees.get(&id)?.clone();
        employee.email = employee
            .user_id
            .and_then(|uid| self.users.get(&uid))
            .map(|u| u.email.clone());
        Some(employee)
    }

    fn employee_name(&self, id: u64) -> Option<String> {
        self.employees.get(&id).map(|e| e.full_name.clone())
    }

    fn employee_email(&self, id: u64) -> Option<String> {
        self.employee(id).and_then(|e| e.email)
    }

    fn leave(&self, id: u64) -> Option<LeaveRequest> {
        let mut leave = self.leaves.get(&id)?.clone();
        leave.employee_name = self.employee_name(leave.employee_id);
        Some(leave)
    }

    fn message(&self, id: u64) -> Option<InternalMessage> {
        let mut message = self.messages.get(&id)?.clone();
        message.sender_name = self.employee_name(message.sender_id);
        message.sender_email = self.employee_email(message.sender_id);
        message.receiver_name = self.employee_name(message.receiver_id);
        message.receiver_email = self.employee_email(message.receiver_id);
        Some(message)
    }

    fn document(&self, id: u64) -> Option<EmployeeDocument> {
        let mut doc = self.documents.get(&id)?.clone();
        doc.employee_name = self.employee_name(doc.employee_id);
        doc.employee_email = self.employee_email(doc.employee_id);
        doc.document_type_name = self
            .document_types
            .get(&doc.document_type_id)
            .map(|t| t.name.clone());
        Some(doc)
    }

    fn require_employee(&self, id: u64) -> AppResult<()> {
        if self.employees.contains_key(&id) {
            Ok(())
        } else {
            Err(AppError::Internal(format!("foreign key violation: employee {id}")))
        }
    }

    fn type_name_clash(&self, name: &str, except: Option<u64>) -> bool {
        self.document_types
            .values()
            .any(|t| Some(t.id) != except && t.name.eq_ignore_ascii_case(name.trim()))
    }

    fn remove_messages(&mut self, doomed: impl Fn(&InternalMessage) -> bool) {
        self.messages.retain(|_, m| !doomed(m));
        let remaining: Vec<u64> = self.messages.keys().copied().collect();
        for message in self.messages.values_mut() {
            if let Some(parent) = message.reply_to_id {
                if !remaining.contains(&parent) {
                    message.reply_to_id = None;
                }
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Holds the store lock for its whole lifetime and works on a private copy of the state.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

impl Tx for MemoryTx {
    async fn commit(self) -> AppResult<()> {
        let MemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, u64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn page<T>(items: Vec<T>, limit: u64, offset: u64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

impl UserRepo for MemoryTx {
    async fn find_user(&mut self, id: u64) -> AppResult<Option<UserAccount>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<UserAccount>> {
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> AppResult<UserAccount> {
        if self.working.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let id = self.working.next_id();
        let account = UserAccount {
            id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        self.working.users.insert(id, account.clone());
        Ok(account)
    }

    async fn update_password(&mut self, user_id: u64, password_hash: &str) -> AppResult<()> {
        if let Some(user) = self.working.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn delete_user(&mut self, id: u64) -> AppResult<()> {
        self.working.users.remove(&id);
        for employee in self.working.employees.values_mut() {
            if employee.user_id == Some(id) {
                employee.user_id = None;
            }
        }
        Ok(())
    }
}

impl EmployeeRepo for MemoryTx {
    async fn find_employee(&mut self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.working.employee(id))
    }

    async fn lock_employee(&mut self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.working.employee(id))
    }

    async fn find_employee_by_user(&mut self, user_id: u64) -> AppResult<Option<Employee>> {
        let id = self
            .working
            .employees
            .values()
            .find(|e| e.user_id == Some(user_id))
            .map(|e| e.id);
        Ok(id.and_then(|id| self.working.employee(id)))
    }

    async fn list_employees(&mut self) -> AppResult<Vec<Employee>> {
        let mut all: Vec<Employee> = self
            .working
            .employees
            .keys()
            .filter_map(|id| self.working.employee(*id))
            .collect();
        all.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn list_employees_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<Employee>> {
        Ok(page(self.list_employees().await?, limit, offset))
    }

    async fn count_employees(&mut self) -> AppResult<i64> {
        Ok(self.working.employees.len() as i64)
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee> {
        if let Some(uid) = employee.user_id {
            if self.working.employees.values().any(|e| e.user_id == Some(uid)) {
                return Err(AppError::Conflict("Record already exists".into()));
            }
        }
        let id = self.working.next_id();
        let now = Utc::now();
        let profile = employee.profile;
        let row = Employee {
            id,
            user_id: employee.user_id,
            email: None,
            full_name: profile.full_name,
            position: profile.position,
            department: profile.department,
            phone: profile.phone,
            address: profile.address,
            date_of_birth: profile.date_of_birth,
            join_date: profile.join_date,
            remaining_leave_days: employee.remaining_leave_days,
            profile_photo_path: None,
            created_at: now,
            updated_at: now,
        };
        self.working.employees.insert(id, row);
        self.working
            .employee(id)
            .ok_or_else(|| AppError::not_found("Employee", id))
    }

    async fn save_employee(&mut self, employee: &Employee) -> AppResult<Employee> {
        let id = employee.id;
        let row = self
            .working
            .employees
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Employee", id))?;
        let created_at = row.created_at;
        let user_id = row.user_id;
        *row = employee.clone();
        row.created_at = created_at;
        row.user_id = user_id;
        row.updated_at = Utc::now();
        self.working
            .employee(id)
            .ok_or_else(|| AppError::not_found("Employee", id))
    }

    async fn delete_employee(&mut self, id: u64) -> AppResult<()> {
        let state = &mut self.working;
        state.employees.remove(&id);
        state.leaves.retain(|_, l| l.employee_id != id);
        state.documents.retain(|_, d| d.employee_id != id);
        state.remove_messages(|m| m.involves(id));
        Ok(())
    }
}

impl LeaveRepo for MemoryTx {
    async fn insert_leave(&mut self, leave: NewLeaveRequest) -> AppResult<LeaveRequest> {
        self.working.require_employee(leave.employee_id)?;
        let id = self.working.next_id();
        let now = Utc::now();
        self.working.leaves.insert(
            id,
            LeaveRequest {
                id,
                employee_id: leave.employee_id,
                employee_name: None,
                start_date: leave.start_date,
                end_date: leave.end_date,
                reason: leave.reason,
                status: LeaveStatus::Pending,
                attachment_path: leave.attachment_path,
                created_at: now,
                updated_at: now,
            },
        );
        self.working
            .leave(id)
            .ok_or_else(|| AppError::not_found("Leave request", id))
    }

    async fn find_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.working.leave(id))
    }

    async fn lock_leave(&mut self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.working.leave(id))
    }

    async fn set_leave_status(&mut self, id: u64, status: LeaveStatus) -> AppResult<LeaveRequest> {
        let row = self
            .working
            .leaves
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Leave request", id))?;
        row.status = status;
        row.updated_at = Utc::now();
        self.working
            .leave(id)
            .ok_or_else(|| AppError::not_found("Leave request", id))
    }

    async fn list_leaves_by_employee(&mut self, employee_id: u64) -> AppResult<Vec<LeaveRequest>> {
        let mut leaves: Vec<LeaveRequest> = self
            .working
            .leaves
            .values()
            .filter(|l| l.employee_id == employee_id)
            .filter_map(|l| self.working.leave(l.id))
            .collect();
        newest_first(&mut leaves, |l| (l.created_at, l.id));
        Ok(leaves)
    }

    async fn list_leaves(&mut self) -> AppResult<Vec<LeaveRequest>> {
        let mut leaves: Vec<LeaveRequest> = self
            .working
            .leaves
            .keys()
            .filter_map(|id| self.working.leave(*id))
            .collect();
        newest_first(&mut leaves, |l| (l.created_at, l.id));
        Ok(leaves)
    }

    async fn list_leaves_page(&mut self, limit: u64, offset: u64) -> AppResult<Vec<LeaveRequest>> {
        Ok(page(self.list_leaves().await?, limit, offset))
    }

    async fn count_leaves(&mut self) -> AppResult<i64> {
        Ok(self.working.leaves.len() as i64)
    }

    async fn count_leaves_by_status(&mut self, status: LeaveStatus) -> AppResult<i64> {
        Ok(self
            .working
            .leaves
            .values()
            .filter(|l| l.status == status)
            .count() as i64)
    }
}

impl MessageRepo for MemoryTx {
    async fn insert_message(&mut self, message: NewMessage) -> AppResult<InternalMessage> {
        self.working.require_employee(message.sender_id)?;
        self.working.require_employee(message.receiver_id)?;
        let id = self.working.next_id();
        self.working.messages.insert(
            id,
            InternalMessage {
                id,
                sender_id: message.sender_id,
                sender_name: None,
                sender_email: None,
                receiver_id: message.receiver_id,
                receiver_name: None,
                receiver_email: None,
                subject: message.subject,
                body: message.body,
                reply_to_id: message.reply_to_id,
                thread_id: message.thread_id,
                attachment_name: message.attachment.name,
                attachment_type: message.attachment.content_type,
                attachment_size: message.attachment.size,
                attachment_path: message.attachment.path,
                is_read: false,
                created_at: Utc::now(),
            },
        );
        self.working
            .message(id)
            .ok_or_else(|| AppError::not_found("Message", id))
    }

    async fn set_thread_id(&mut self, id: u64, thread_id: u64) -> AppResult<()> {
        if let Some(message) = self.working.messages.get_mut(&id) {
            message.thread_id = Some(thread_id);
        }
        Ok(())
    }

    async fn find_message(&mut self, id: u64) -> AppResult<Option<InternalMessage>> {
        Ok(self.working.message(id))
    }

    async fn list_messages_for_participant(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<InternalMessage>> {
        let mut messages: Vec<InternalMessage> = self
            .working
            .messages
            .values()
            .filter(|m| m.involves(employee_id) && m.thread_id.is_some())
            .filter_map(|m| self.working.message(m.id))
            .collect();
        newest_first(&mut messages, |m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn list_sent(&mut self, sender_id: u64) -> AppResult<Vec<InternalMessage>> {
        let mut messages: Vec<InternalMessage> = self
            .working
            .messages
            .values()
            .filter(|m| m.sender_id == sender_id)
            .filter_map(|m| self.working.message(m.id))
            .collect();
        newest_first(&mut messages, |m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn list_thread(&mut self, thread_id: u64) -> AppResult<Vec<InternalMessage>> {
        let mut messages: Vec<InternalMessage> = self
            .working
            .messages
            .values()
            .filter(|m| m.thread_id == Some(thread_id))
            .filter_map(|m| self.working.message(m.id))
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn thread_has_participant(&mut self, thread_id: u64, employee_id: u64) -> AppResult<bool> {
        Ok(self
            .working
            .messages
            .values()
            .any(|m| m.thread_id == Some(thread_id) && m.involves(employee_id)))
    }

    async fn mark_read(&mut self, id: u64) -> AppResult<()> {
        if let Some(message) = self.working.messages.get_mut(&id) {
            message.is_read = true;
        }
        Ok(())
    }

    async fn delete_message(&mut self, id: u64) -> AppResult<()> {
        self.working.remove_messages(|m| m.id == id);
        Ok(())
    }

    async fn count_unread(&mut self, receiver_id: u64) -> AppResult<i64> {
        Ok(self
            .working
            .messages
            .values()
            .filter(|m| m.receiver_id == receiver_id && !m.is_read)
            .count() as i64)
    }
}

impl DocumentRepo for MemoryTx {
    async fn list_document_types(&mut self) -> AppResult<Vec<DocumentType>> {
        let mut types: Vec<DocumentType> = self.working.document_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(types)
    }

    async fn list_document_types_page(
        &mut self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<DocumentType>> {
        Ok(page(self.list_document_types().await?, limit, offset))
    }

    async fn count_document_types(&mut self) -> AppResult<i64> {
        Ok(self.working.document_types.len() as i64)
    }

    async fn find_document_type(&mut self, id: u64) -> AppResult<Option<DocumentType>> {
        Ok(self.working.document_types.get(&id).cloned())
    }

    async fn document_type_name_taken(&mut self, name: &str) -> AppResult<bool> {
        Ok(self.working.type_name_clash(name, None))
    }

    async fn insert_document_type(&mut self, input: DocumentTypeInput) -> AppResult<DocumentType> {
        if self.working.type_name_clash(&input.name, None) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        let id = self.working.next_id();
        let row = DocumentType {
            id,
            name: input.name,
            description: input.description,
            mandatory: input.mandatory,
            created_at: Utc::now(),
        };
        self.working.document_types.insert(id, row.clone());
        Ok(row)
    }

    async fn update_document_type(
        &mut self,
        id: u64,
        input: DocumentTypeInput,
    ) -> AppResult<DocumentType> {
        if self.working.type_name_clash(&input.name, Some(id)) {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        let row = self
            .working
            .document_types
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Document type", id))?;
        row.name = input.name;
        row.description = input.description;
        row.mandatory = input.mandatory;
        Ok(row.clone())
    }

    async fn delete_document_type(&mut self, id: u64) -> AppResult<()> {
        self.working.document_types.remove(&id);
        self.working.documents.retain(|_, d| d.document_type_id != id);
        Ok(())
    }

    async fn list_documents_for_employee(
        &mut self,
        employee_id: u64,
    ) -> AppResult<Vec<EmployeeDocument>> {
        let mut docs: Vec<EmployeeDocument> = self
            .working
            .documents
            .values()
            .filter(|d| d.employee_id == employee_id)
            .filter_map(|d| self.working.document(d.id))
            .collect();
        newest_first(&mut docs, |d| (d.uploaded_at, d.id));
        Ok(docs)
    }

    async fn list_documents_by_type(&mut self, type_id: u64) -> AppResult<Vec<EmployeeDocument>> {
        let mut docs: Vec<EmployeeDocument> = self
            .working
            .documents
            .values()
            .filter(|d| d.document_type_id == type_id)
            .filter_map(|d| self.working.document(d.id))
            .collect();
        docs.sort_by_key(|d| (d.employee_id, d.id));
        Ok(docs)
    }

    async fn list_documents(&mut self) -> AppResult<Vec<EmployeeDocument>> {
        let mut docs: Vec<EmployeeDocument> = self
            .working
            .documents
            .keys()
            .filter_map(|id| self.working.document(*id))
            .collect();
        docs.sort_by_key(|d| (d.employee_id, d.id));
        Ok(docs)
    }

    async fn count_documents(&mut self) -> AppResult<i64> {
        Ok(self.working.documents.len() as i64)
    }

    async fn find_document(&mut self, id: u64) -> AppResult<Option<EmployeeDocument>> {
        Ok(self.working.document(id))
    }

    async fn find_document_for(
        &mut self,
        employee_id: u64,
        type_id: u64,
    ) -> AppResult<Option<EmployeeDocument>> {
        let id = self
            .working
            .documents
            .values()
            .find(|d| d.employee_id == employee_id && d.document_type_id == type_id)
            .map(|d| d.id);
        Ok(id.and_then(|id| self.working.document(id)))
    }

    async fn insert_document(&mut self, doc: NewEmployeeDocument) -> AppResult<EmployeeDocument> {
        self.working.require_employee(doc.employee_id)?;
        let duplicate = self
            .working
            .documents
            .values()
            .any(|d| d.employee_id == doc.employee_id && d.document_type_id == doc.document_type_id);
        if duplicate {
            return Err(AppError::Conflict("Record already exists".into()));
        }
        let id = self.working.next_id();
        self.working.documents.insert(
            id,
            EmployeeDocument {
                id,
                employee_id: doc.employee_id,
                employee_name: None,
                employee_email: None,
                document_type_id: doc.document_type_id,
                document_type_name: None,
                original_filename: doc.original_filename,
                stored_path: doc.stored_path,
                content_type: doc.content_type,
                size: doc.size,
                uploaded_at: Utc::now(),
            },
        );
        self.working
            .document(id)
            .ok_or_else(|| AppError::not_found("Document", id))
    }

    async fn delete_document(&mut self, id: u64) -> AppResult<()> {
        self.working.documents.remove(&id);
        Ok(())
    }
}

impl SettingRepo for MemoryTx {
    async fn find_settings(&mut self) -> AppResult<Option<AppSetting>> {
        Ok(self.working.settings.clone())
    }

    async fn save_settings(&mut self, settings: &AppSetting) -> AppResult<AppSetting> {
        let mut row = settings.clone();
        row.id = SETTINGS_ID;
        row.updated_at = Utc::now();
        self.working.settings = Some(row.clone());
        Ok(row)
    }
}
