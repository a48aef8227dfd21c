use std::collections::HashSet;

use super::require_text;
use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;
use crate::model::message::{AttachmentMeta, InternalMessage, NewMessage};
use crate::storage::{Storage, Upload};
use crate::store::{EmployeeRepo, MessageRepo, Store, Tx};

const SUBJECT_MAX: usize = 500;
const BODY_MAX: usize = 10_000;

#[derive(Debug, Clone, Default)]
pub struct SendInput {
    pub receiver_ids: Vec<u64>,
    pub subject: String,
    pub body: String,
    pub reply_to_id: Option<u64>,
}

/// Trims and collapses ASCII whitespace runs to a single space. Other Unicode spaces are
/// kept as content.
pub fn normalize_text(text: &str) -> String {
    text.split(|c: char| c.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Newest received message per thread. Input must be ordered newest first.
pub fn latest_received_per_thread(
    messages: Vec<InternalMessage>,
    employee_id: u64,
) -> Vec<InternalMessage> {
    let mut seen = HashSet::new();
    let mut inbox: Vec<InternalMessage> = messages
        .into_iter()
        .filter(|m| m.receiver_id == employee_id)
        .filter(|m| seen.insert(m.thread_id))
        .collect();
    inbox.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    inbox
}

/// Collapses the copies of a batch send into the first one seen. Input must be ordered
/// newest first; output keeps that order.
pub fn collapse_sent(messages: Vec<InternalMessage>) -> Vec<InternalMessage> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| {
            seen.insert((
                normalize_text(&m.body),
                normalize_text(&m.subject),
                m.thread_id,
            ))
        })
        .collect()
}

pub struct Messaging<'a, S> {
    store: &'a S,
    storage: &'a Storage,
}

impl<'a, S: Store> Messaging<'a, S> {
    pub fn new(store: &'a S, storage: &'a Storage) -> Self {
        Self { store, storage }
    }

    /// Sends one copy per receiver. All copies share a thread: the replied-to message's
    /// thread, or else the id of the first copy.
    pub async fn send(
        &self,
        sender: &Employee,
        input: SendInput,
        attachment: Option<Upload>,
    ) -> AppResult<Vec<InternalMessage>> {
        if input.receiver_ids.is_empty() {
            return Err(AppError::validation("Receiver IDs are required"));
        }
        require_text("Subject", &input.subject, SUBJECT_MAX)?;
        require_text("Body", &input.body, BODY_MAX)?;

        let mut tx = self.store.begin().await?;

        let thread_id = match input.reply_to_id {
            Some(reply_to) => {
                tx.find_message(reply_to)
                    .await?
                    .ok_or_else(|| AppError::not_found("Message", reply_to))?
                    .thread_id
            }
            None => None,
        };

        for &receiver_id in &input.receiver_ids {
            if tx.find_employee(receiver_id).await?.is_none() {
                return Err(AppError::not_found("Employee", receiver_id));
            }
        }

        let attachment = match attachment.filter(|a| !a.is_empty()) {
            Some(upload) => {
                let path = self
                    .storage
                    .store(&upload, &format!("message-attachments/{}", sender.id))
                    .await?;
                AttachmentMeta {
                    size: Some(upload.size()),
                    name: upload.filename,
                    content_type: upload.content_type,
                    path: Some(path),
                }
            }
            None => AttachmentMeta::default(),
        };
        let stored_path = attachment.path.clone();

        match write_batch(tx, sender.id, input, thread_id, attachment).await {
            Ok(sent) => {
                tracing::info!(
                    sender_id = sender.id,
                    recipients = sent.len(),
                    thread_id = ?sent.first().and_then(|m| m.thread_id),
                    "Message sent"
                );
                Ok(sent)
            }
            Err(e) => {
                if let Some(path) = &stored_path {
                    self.storage.delete_best_effort(path).await;
                }
                Err(e)
            }
        }
    }

    pub async fn inbox(&self, employee: &Employee) -> AppResult<Vec<InternalMessage>> {
        let mut tx = self.store.begin().await?;
        let messages = tx.list_messages_for_participant(employee.id).await?;
        Ok(latest_received_per_thread(messages, employee.id))
    }

    pub async fn sent(&self, employee: &Employee) -> AppResult<Vec<InternalMessage>> {
        let mut tx = self.store.begin().await?;
        let messages = tx.list_sent(employee.id).await?;
        Ok(collapse_sent(messages))
    }

    /// Whole thread, oldest first, for a participant of it.
    pub async fn thread_by_id(&self, employee: &Employee, thread_id: u64) -> AppResult<Vec<InternalMessage>> {
        let mut tx = self.store.begin().await?;
        if !tx.thread_has_participant(thread_id, employee.id).await? {
            return Err(AppError::Forbidden("Cannot view this thread".into()));
        }
        tx.list_thread(thread_id).await
    }

    pub async fn thread_by_message_id(
        &self,
        employee: &Employee,
        message_id: u64,
    ) -> AppResult<Vec<InternalMessage>> {
        let message = self.find(message_id).await?;
        let thread_id = message
            .thread_id
            .ok_or_else(|| AppError::NotFound("Thread not found: thread id not set".into()))?;
        self.thread_by_id(employee, thread_id).await
    }

    pub async fn mark_as_read(&self, employee: &Employee, message_id: u64) -> AppResult<InternalMessage> {
        let mut tx = self.store.begin().await?;
        let message = tx
            .find_message(message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message", message_id))?;
        if message.receiver_id != employee.id {
            return Err(AppError::Forbidden(
                "Cannot mark message as read - not the receiver".into(),
            ));
        }
        tx.mark_read(message_id).await?;
        tx.commit().await?;
        Ok(InternalMessage {
            is_read: true,
            ..message
        })
    }

    pub async fn get_by_id(&self, employee: &Employee, message_id: u64) -> AppResult<InternalMessage> {
        let message = self.find(message_id).await?;
        if !message.involves(employee.id) {
            return Err(AppError::Forbidden("Cannot view this message".into()));
        }
        Ok(message)
    }

    /// Removes one copy. Replies keep their thread; their reply link is cleared.
    pub async fn delete(&self, employee: &Employee, message_id: u64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let message = tx
            .find_message(message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message", message_id))?;
        if !message.involves(employee.id) {
            return Err(AppError::Forbidden("Cannot delete this message".into()));
        }
        tx.delete_message(message_id).await?;
        tx.commit().await?;
        tracing::info!(message_id, employee_id = employee.id, "Message deleted");
        Ok(())
    }

    pub async fn unread_count(&self, employee: &Employee) -> AppResult<i64> {
        let mut tx = self.store.begin().await?;
        tx.count_unread(employee.id).await
    }

    /// Everyone the employee can write to.
    pub async fn recipients(&self, employee: &Employee) -> AppResult<Vec<Employee>> {
        let mut tx = self.store.begin().await?;
        let mut all = tx.list_employees().await?;
        all.retain(|e| e.id != employee.id);
        Ok(all)
    }

    async fn find(&self, message_id: u64) -> AppResult<InternalMessage> {
        let mut tx = self.store.begin().await?;
        tx.find_message(message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message", message_id))
    }
}

async fn write_batch<T: Tx>(
    mut tx: T,
    sender_id: u64,
    input: SendInput,
    inherited_thread: Option<u64>,
    attachment: AttachmentMeta,
) -> AppResult<Vec<InternalMessage>> {
    let mut sent = Vec::with_capacity(input.receiver_ids.len());
    for &receiver_id in &input.receiver_ids {
        let message = tx
            .insert_message(NewMessage {
                sender_id,
                receiver_id,
                subject: input.subject.clone(),
                body: input.body.clone(),
                reply_to_id: input.reply_to_id,
                thread_id: inherited_thread,
                attachment: attachment.clone(),
            })
            .await?;
        sent.push(message);
    }

    let thread_id = match inherited_thread {
        Some(id) => id,
        None => sent
            .first()
            .map(|m| m.id)
            .ok_or_else(|| AppError::Internal("Batch send produced no messages".into()))?,
    };
    for message in &mut sent {
        if message.thread_id != Some(thread_id) {
            tx.set_thread_id(message.id, thread_id).await?;
            message.thread_id = Some(thread_id);
        }
    }

    tx.commit().await?;
    Ok(sent)
}
