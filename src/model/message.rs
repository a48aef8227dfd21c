use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct InternalMessage {
    pub id: u64,
    pub sender_id: u64,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub receiver_id: u64,
    pub receiver_name: Option<String>,
    pub receiver_email: Option<String>,
    pub subject: String,
    pub body: String,
    pub reply_to_id: Option<u64>,
    /// Unset only between insert and backfill inside a send.
    pub thread_id: Option<u64>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
    pub attachment_size: Option<i64>,
    pub attachment_path: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Attachment metadata shared by every copy of a batch send.
#[derive(Debug, Clone, Default)]
pub struct AttachmentMeta {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub size: Option<i64>,
    pub path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: u64,
    pub receiver_id: u64,
    pub subject: String,
    pub body: String,
    pub reply_to_id: Option<u64>,
    pub thread_id: Option<u64>,
    pub attachment: AttachmentMeta,
}

impl InternalMessage {
    pub fn involves(&self, employee_id: u64) -> bool {
        self.sender_id == employee_id || self.receiver_id == employee_id
    }
}
