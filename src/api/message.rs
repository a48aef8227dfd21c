use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{current_employee, urls};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::model::employee::Employee;
use crate::model::message::InternalMessage;
use crate::services::message::{Messaging, SendInput};
use crate::services::settings::UrlBuilder;
use crate::storage::Storage;
use crate::store::mysql::MySqlStore;
use crate::utils::multipart::FormParts;

/// The JSON `data` part of a send.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalMessageRequest {
    #[schema(example = json!([2, 3]))]
    #[serde(default)]
    pub receiver_ids: Vec<u64>,
    #[schema(example = "Team outing")]
    #[serde(default)]
    pub subject: String,
    #[schema(example = "Friday at 5pm?")]
    #[serde(default)]
    pub body: String,
    pub reply_to_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalMessageResponse {
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
    pub thread_id: Option<u64>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
    pub attachment_size: Option<i64>,
    pub attachment_url: Option<String>,
    pub is_read: bool,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl InternalMessageResponse {
    pub fn from_model(message: InternalMessage, urls: &UrlBuilder) -> Self {
        Self {
            attachment_url: urls.file_url(message.attachment_path.as_deref()),
            id: message.id,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            sender_email: message.sender_email,
            receiver_id: message.receiver_id,
            receiver_name: message.receiver_name,
            receiver_email: message.receiver_email,
            subject: message.subject,
            body: message.body,
            reply_to_id: message.reply_to_id,
            thread_id: message.thread_id,
            attachment_name: message.attachment_name,
            attachment_type: message.attachment_type,
            attachment_size: message.attachment_size,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

/// A colleague the caller can write to.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipientResponse {
    pub id: u64,
    pub full_name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

impl From<Employee> for RecipientResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            full_name: e.full_name,
            email: e.email,
            position: e.position,
            department: e.department,
        }
    }
}

struct Ctx {
    employee: Employee,
    urls: UrlBuilder,
}

async fn context(
    auth: &AuthUser,
    store: &MySqlStore,
    storage: &Storage,
    config: &Config,
) -> Result<Ctx, AppError> {
    let employee = current_employee(store, storage, auth).await?;
    let urls = urls(store, storage, config).await?;
    Ok(Ctx { employee, urls })
}

fn to_responses(messages: Vec<InternalMessage>, urls: &UrlBuilder) -> Vec<InternalMessageResponse> {
    messages
        .into_iter()
        .map(|m| InternalMessageResponse::from_model(m, urls))
        .collect()
}

/// Send a message to one or more colleagues
#[utoipa::path(
    post,
    path = "/api/employee/messages",
    request_body(
        content = InternalMessageRequest,
        description = "Multipart body: JSON part `data` plus optional file part `attachment`",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 201, description = "One message per receiver, sharing a thread", body = [InternalMessageResponse]),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Unknown receiver or replied-to message", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let form = FormParts::read(payload, config.max_upload_bytes).await?;
    let data: InternalMessageRequest = form.require_json("data")?;
    let attachment = form.file(&["attachment", "file"]);

    let ctx = context(&auth, &store, &storage, &config).await?;
    let sent = Messaging::new(store.get_ref(), storage.get_ref())
        .send(
            &ctx.employee,
            SendInput {
                receiver_ids: data.receiver_ids,
                subject: data.subject,
                body: data.body,
                reply_to_id: data.reply_to_id,
            },
            attachment,
        )
        .await?;
    Ok(HttpResponse::Created().json(to_responses(sent, &ctx.urls)))
}

/// Colleagues the caller can message
#[utoipa::path(
    get,
    path = "/api/employee/messages/recipients",
    responses((status = 200, description = "Every employee except the caller", body = [RecipientResponse])),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn recipients(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    let list = Messaging::new(store.get_ref(), storage.get_ref())
        .recipients(&employee)
        .await?;
    let body: Vec<RecipientResponse> = list.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Inbox: latest received message per thread
#[utoipa::path(
    get,
    path = "/api/employee/messages/inbox",
    responses((status = 200, description = "One entry per thread, newest first", body = [InternalMessageResponse])),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn inbox(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let messages = Messaging::new(store.get_ref(), storage.get_ref())
        .inbox(&ctx.employee)
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(messages, &ctx.urls)))
}

/// Sent messages, one entry per batch send
#[utoipa::path(
    get,
    path = "/api/employee/messages/sent",
    responses((status = 200, description = "Sent messages, newest first", body = [InternalMessageResponse])),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn sent(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let messages = Messaging::new(store.get_ref(), storage.get_ref())
        .sent(&ctx.employee)
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(messages, &ctx.urls)))
}

/// Number of unread received messages
#[utoipa::path(
    get,
    path = "/api/employee/messages/unread-count",
    responses((status = 200, description = "Unread count", body = Object, example = json!({ "count": 3 }))),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    let count = Messaging::new(store.get_ref(), storage.get_ref())
        .unread_count(&employee)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}

/// Whole thread of the given message, oldest first
#[utoipa::path(
    get,
    path = "/api/employee/messages/thread/by-id/{id}",
    params(("id", Path, description = "Id of any message in the thread")),
    responses(
        (status = 200, description = "Thread messages", body = [InternalMessageResponse]),
        (status = 403, description = "Caller is not part of the thread", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn thread_by_message(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let messages = Messaging::new(store.get_ref(), storage.get_ref())
        .thread_by_message_id(&ctx.employee, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(messages, &ctx.urls)))
}

/// Whole thread by thread id, oldest first
#[utoipa::path(
    get,
    path = "/api/employee/messages/thread/by-thread/{threadId}",
    params(("threadId", Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread messages", body = [InternalMessageResponse]),
        (status = 403, description = "Caller is not part of the thread", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn thread_by_thread(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let messages = Messaging::new(store.get_ref(), storage.get_ref())
        .thread_by_id(&ctx.employee, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(messages, &ctx.urls)))
}

/// One message, for its sender or receiver
#[utoipa::path(
    get,
    path = "/api/employee/messages/{id}",
    params(("id", Path, description = "Message id")),
    responses(
        (status = 200, description = "Message", body = InternalMessageResponse),
        (status = 403, description = "Not sender or receiver", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn get_message(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let message = Messaging::new(store.get_ref(), storage.get_ref())
        .get_by_id(&ctx.employee, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(InternalMessageResponse::from_model(message, &ctx.urls)))
}

/// Mark a received message as read
#[utoipa::path(
    put,
    path = "/api/employee/messages/{id}/read",
    params(("id", Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked read", body = InternalMessageResponse),
        (status = 403, description = "Not the receiver", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let ctx = context(&auth, &store, &storage, &config).await?;
    let message = Messaging::new(store.get_ref(), storage.get_ref())
        .mark_as_read(&ctx.employee, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(InternalMessageResponse::from_model(message, &ctx.urls)))
}

/// Delete one message copy
#[utoipa::path(
    delete,
    path = "/api/employee/messages/{id}",
    params(("id", Path, description = "Message id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not sender or receiver", body = ErrorBody),
        (status = 404, description = "Message not found", body = ErrorBody)
    ),
    tag = "Message",
    security(("bearer_auth" = []))
)]
pub async fn delete_message(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    storage: web::Data<Storage>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee = current_employee(&store, &storage, &auth).await?;
    Messaging::new(store.get_ref(), storage.get_ref())
        .delete(&employee, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
