use crate::{
    error::AppError,
    middleware::guards::User,
    models::MessageType,
    routes::store_call,
    services::{ConversationService, MessageService, PartnerPolicy},
    state::AppState,
    websocket::events,
};
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver: Uuid,
    pub content: String,
    /// Defaults to "text", matching the platform's web client.
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub after_seq: Option<i64>,
    pub limit: Option<i64>,
}

/// POST /messages/send
///
/// Persist first, push second. The push is a latency optimization only; an
/// offline receiver changes nothing about the response.
#[post("/send")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: User,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let message_type = MessageType::parse(body.message_type.as_deref().unwrap_or("text"))?;

    let message = store_call(&state.config, || {
        MessageService::send_message_db(
            &state.db,
            user.id,
            body.receiver,
            &body.content,
            message_type,
        )
    })
    .await?;

    events::push_new_message(&state.registry, &message).await;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
    })))
}

/// GET /messages/m/{receiver}
///
/// Full history with one partner, both directions, ascending by sequence
/// number. `after_seq` restarts a paged read where the last one stopped.
#[get("/m/{receiver}")]
pub async fn get_messages(
    state: web::Data<AppState>,
    user: User,
    receiver: web::Path<Uuid>,
    params: web::Query<HistoryParams>,
) -> Result<HttpResponse, AppError> {
    let receiver = receiver.into_inner();

    let messages = store_call(&state.config, || {
        MessageService::history_db(&state.db, user.id, receiver, params.after_seq, params.limit)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "messages": messages,
    })))
}

/// GET /messages/recent-chats
///
/// The derived conversation list, most recent first. Endusers see their
/// professionals and vice versa; the pairing rule lives in the policy value,
/// not in the aggregation.
#[get("/recent-chats")]
pub async fn get_recent_chats(
    state: web::Data<AppState>,
    user: User,
) -> Result<HttpResponse, AppError> {
    let policy = PartnerPolicy::complementary_roles();

    let conversations = store_call(&state.config, || {
        ConversationService::recent_conversations(&state.db, user.id, &policy)
    })
    .await?;

    Ok(HttpResponse::Ok().json(conversations))
}

/// POST /messages/read/{sender_id}
///
/// Mark the whole unread backlog from one sender as read. Idempotent; the
/// response reports how many records the batch actually touched.
#[post("/read/{sender_id}")]
pub async fn mark_as_read(
    state: web::Data<AppState>,
    user: User,
    sender_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let sender_id = sender_id.into_inner();

    let updated = store_call(&state.config, || {
        MessageService::mark_read_db(&state.db, user.id, sender_id)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "updated": updated,
    })))
}
