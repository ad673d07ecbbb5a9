use crate::{
    error::AppError,
    middleware::CurrentUser,
    services::{fan_out, NewMessage},
    state::AppState,
};
use actix_web::{post, web, HttpResponse};
use event_schema::LiveEvent;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/messages
/// Append a message and push the refreshed conversation to every member
/// as `conversation:update`.
#[post("/api/messages")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let text = non_blank(req.body);
    let image = non_blank(req.image);

    if text.is_none() && image.is_none() {
        return Err(AppError::InvalidData("message needs a body or an image".into()));
    }

    let (message, conversation) = state
        .store
        .append_message(NewMessage {
            conversation_id: req.conversation_id,
            sender_id: user.id,
            body: text,
            image,
        })
        .await?
        .ok_or(AppError::InvalidId)?;

    tracing::debug!(
        conversation_id = %conversation.id,
        message_id = %message.id,
        sender = %user.id,
        "message appended"
    );

    fan_out(&state.publisher, &LiveEvent::Update(conversation));

    Ok(HttpResponse::Ok().json(message))
}
