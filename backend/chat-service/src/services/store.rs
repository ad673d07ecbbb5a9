//! Persistence contract for conversations
//!
//! Handlers only talk to [`ConversationStore`]; the PostgreSQL implementation
//! lives in `services::postgres_store`.

use async_trait::async_trait;
use event_schema::{ConversationSummary, MessageSummary};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("inconsistent data: {0}")]
    Corrupt(String),

    /// Some requested members do not exist; nothing was written
    #[error("unknown members: {found} of {expected} users exist")]
    UnknownMembers { expected: usize, found: usize },
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub name: Option<String>,
    pub is_group: bool,
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: Option<String>,
    pub image: Option<String>,
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversation with its members and latest message
    async fn find_with_members(&self, id: Uuid) -> Result<Option<ConversationSummary>, StoreError>;

    /// Delete the conversation only if `member_id` belongs to it.
    ///
    /// Returns the number of conversations removed (0 or 1). Zero is not an error.
    async fn delete_for_member(&self, id: Uuid, member_id: Uuid) -> Result<u64, StoreError>;

    /// Conversations the user belongs to, most recent activity first
    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Existing one-to-one conversation between two users
    async fn find_direct_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<ConversationSummary>, StoreError>;

    /// Create a conversation with every listed member.
    ///
    /// Fails with [`StoreError::UnknownMembers`] and writes nothing when any member id is unknown.
    async fn create(&self, new: NewConversation) -> Result<ConversationSummary, StoreError>;

    /// Append a message and bump the conversation's activity time.
    ///
    /// Returns `None` when the conversation does not exist or the sender is not a member.
    async fn append_message(
        &self,
        new: NewMessage,
    ) -> Result<Option<(MessageSummary, ConversationSummary)>, StoreError>;
}
