//! Conversation endpoints
//!
//! Every change is fanned out to the members' live channels:
//! creation as `conversation:new`, deletion as `conversation:remove`.

use crate::{
    error::AppError,
    middleware::CurrentUser,
    services::{fan_out, NewConversation, StoreError},
    state::AppState,
};
use actix_web::{delete, get, post, web, HttpResponse};
use event_schema::LiveEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// Other participant of a direct conversation
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub name: Option<String>,
    /// Other participants of a group conversation
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub count: u64,
}

impl CreateConversationRequest {
    /// Validated members and name, requester included in the members
    fn into_new_conversation(self, requester: Uuid) -> Result<NewConversation, AppError> {
        if self.is_group {
            let name = self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .ok_or_else(|| AppError::InvalidData("group name required".into()))?;

            let mut member_ids: Vec<Uuid> = Vec::with_capacity(self.members.len() + 1);
            for id in self.members {
                if id != requester && !member_ids.contains(&id) {
                    member_ids.push(id);
                }
            }
            if member_ids.len() < 2 {
                return Err(AppError::InvalidData(
                    "group needs at least two other members".into(),
                ));
            }
            member_ids.push(requester);

            return Ok(NewConversation {
                name: Some(name),
                is_group: true,
                member_ids,
            });
        }

        let other = self
            .user_id
            .filter(|id| *id != requester)
            .ok_or_else(|| AppError::InvalidData("direct conversation needs another user".into()))?;

        Ok(NewConversation {
            name: None,
            is_group: false,
            member_ids: vec![requester, other],
        })
    }
}

// ============================================
// Endpoints
// ============================================

/// GET /api/conversations
/// Conversations of the caller, most recent activity first
#[get("/api/conversations")]
pub async fn get_conversations(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let conversations = state.store.list_for_member(user.id).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

/// POST /api/conversations
/// Create a direct or group conversation.
///
/// A direct conversation that already exists between the two users is
/// returned unchanged and no live event is sent.
#[post("/api/conversations")]
pub async fn create_conversation(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateConversationRequest>,
) -> Result<HttpResponse, AppError> {
    let new = body.into_inner().into_new_conversation(user.id)?;

    // Check-then-create is not atomic; concurrent requests may both create a direct pair
    if !new.is_group {
        if let Some(existing) = state
            .store
            .find_direct_between(new.member_ids[0], new.member_ids[1])
            .await?
        {
            return Ok(HttpResponse::Ok().json(existing));
        }
    }

    let conversation = state.store.create(new).await.map_err(|e| match e {
        err @ StoreError::UnknownMembers { .. } => AppError::InvalidData(err.to_string()),
        other => other.into(),
    })?;
    tracing::info!(
        conversation_id = %conversation.id,
        creator = %user.id,
        is_group = conversation.is_group,
        members = conversation.users.len(),
        "conversation created"
    );

    let event = LiveEvent::New(conversation);
    fan_out(&state.publisher, &event);

    Ok(HttpResponse::Ok().json(event.conversation()))
}

/// DELETE /api/conversations/{conversation_id}
/// Delete a conversation the caller belongs to.
///
/// Callers who are not members get `{"count": 0}`. Every member of the
/// conversation as it was before the delete is notified, the caller included.
#[delete("/api/conversations/{conversation_id}")]
pub async fn delete_conversation(
    state: web::Data<AppState>,
    user: CurrentUser,
    conversation_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let conversation_id =
        Uuid::parse_str(&conversation_id.into_inner()).map_err(|_| AppError::InvalidId)?;

    let existing = state
        .store
        .find_with_members(conversation_id)
        .await?
        .ok_or(AppError::InvalidId)?;

    let count = state.store.delete_for_member(conversation_id, user.id).await?;
    tracing::info!(%conversation_id, requester = %user.id, count, "conversation delete");

    let notified = fan_out(&state.publisher, &LiveEvent::Remove(existing));
    tracing::debug!(%conversation_id, notified, "conversation:remove fanned out");

    Ok(HttpResponse::Ok().json(DeleteResult { count }))
}
