//! Shared fixtures: in-memory store, recording publisher, session tokens
#![allow(dead_code)]

use async_trait::async_trait;
use chat_service::middleware::Claims;
use chat_service::services::{
    ChannelPublisher, ConversationStore, NewConversation, NewMessage, PublishError, StoreError,
};
use chat_service::state::AppState;
use chrono::Utc;
use event_schema::{ConversationSummary, EventEnvelope, MessageSummary, UserProfile};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-key-min-32-chars-long!!!";

/// Build the service under test with the same middleware order as `main`
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(chat_service::middleware::SessionAuth::new(common::JWT_SECRET))
                .wrap(chat_service::middleware::RequestLogging)
                .app_data(actix_web::web::Data::new($state))
                .configure(chat_service::configure),
        )
        .await
    };
}

pub fn bearer(user: &UserProfile) -> (&'static str, String) {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode JWT");

    ("Authorization", format!("Bearer {token}"))
}

pub fn user(name: &str, email: Option<&str>) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        name: Some(name.to_string()),
        email: email.map(str::to_string),
        image: None,
    }
}

pub fn conversation(users: &[UserProfile]) -> ConversationSummary {
    let now = Utc::now();
    ConversationSummary {
        id: Uuid::new_v4(),
        name: None,
        is_group: users.len() > 2,
        created_at: now,
        last_message_at: now,
        user_ids: users.iter().map(|u| u.id).collect(),
        users: users.to_vec(),
        latest_message: None,
    }
}

// ============================================
// In-memory store
// ============================================

#[derive(Default)]
pub struct MemoryStore {
    conversations: Mutex<Vec<ConversationSummary>>,
    users: Mutex<HashMap<Uuid, UserProfile>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, user: &UserProfile) {
        self.users.lock().unwrap().insert(user.id, user.clone());
    }

    pub fn add_conversation(&self, conversation: &ConversationSummary) {
        for user in &conversation.users {
            self.add_user(user);
        }
        self.conversations.lock().unwrap().push(conversation.clone());
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.conversations.lock().unwrap().iter().any(|c| c.id == id)
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().unwrap().len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_with_members(&self, id: Uuid) -> Result<Option<ConversationSummary>, StoreError> {
        self.enter()?;
        Ok(self.conversations.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn delete_for_member(&self, id: Uuid, member_id: Uuid) -> Result<u64, StoreError> {
        self.enter()?;
        let mut conversations = self.conversations.lock().unwrap();
        let before = conversations.len();
        conversations.retain(|c| !(c.id == id && c.has_member(member_id)));
        Ok((before - conversations.len()) as u64)
    }

    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError> {
        self.enter()?;
        let mut found: Vec<ConversationSummary> = self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.has_member(member_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(found)
    }

    async fn find_direct_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<ConversationSummary>, StoreError> {
        self.enter()?;
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .iter()
            .find(|c| !c.is_group && c.has_member(user_a) && c.has_member(user_b))
            .cloned())
    }

    async fn create(&self, new: NewConversation) -> Result<ConversationSummary, StoreError> {
        self.enter()?;
        let users: Vec<UserProfile> = {
            let known = self.users.lock().unwrap();
            new.member_ids.iter().filter_map(|id| known.get(id).cloned()).collect()
        };
        if users.len() != new.member_ids.len() {
            return Err(StoreError::UnknownMembers {
                expected: new.member_ids.len(),
                found: users.len(),
            });
        }

        let now = Utc::now();
        let created = ConversationSummary {
            id: Uuid::new_v4(),
            name: new.name,
            is_group: new.is_group,
            created_at: now,
            last_message_at: now,
            user_ids: users.iter().map(|u| u.id).collect(),
            users,
            latest_message: None,
        };
        self.conversations.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn append_message(
        &self,
        new: NewMessage,
    ) -> Result<Option<(MessageSummary, ConversationSummary)>, StoreError> {
        self.enter()?;
        let mut conversations = self.conversations.lock().unwrap();
        let Some(conversation) = conversations
            .iter_mut()
            .find(|c| c.id == new.conversation_id && c.has_member(new.sender_id))
        else {
            return Ok(None);
        };

        let message = MessageSummary {
            id: Uuid::new_v4(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            body: new.body,
            image: new.image,
            created_at: Utc::now(),
        };
        conversation.last_message_at = message.created_at;
        conversation.latest_message = Some(message.clone());

        Ok(Some((message, conversation.clone())))
    }
}

// ============================================
// Recording publisher
// ============================================

pub type Published = (String, EventEnvelope);

pub struct RecordingPublisher {
    tx: UnboundedSender<Published>,
    failing: bool,
}

impl RecordingPublisher {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<Published>) {
        Self::with_failure(false)
    }

    /// Records every attempt, then reports failure
    pub fn failing() -> (Arc<Self>, UnboundedReceiver<Published>) {
        Self::with_failure(true)
    }

    fn with_failure(failing: bool) -> (Arc<Self>, UnboundedReceiver<Published>) {
        let (tx, rx) = unbounded_channel();
        (Arc::new(Self { tx, failing }), rx)
    }
}

#[async_trait]
impl ChannelPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, envelope: &EventEnvelope) -> Result<(), PublishError> {
        let _ = self.tx.send((channel.to_string(), envelope.clone()));
        if self.failing {
            let err = serde_json::from_str::<serde_json::Value>("publish refused").unwrap_err();
            return Err(PublishError::Encode(err));
        }
        Ok(())
    }
}

pub fn state(store: Arc<MemoryStore>, publisher: Arc<RecordingPublisher>) -> AppState {
    AppState::new(store, publisher)
}

/// Wait for exactly `n` publishes, then make sure no more arrive
pub async fn expect_published(rx: &mut UnboundedReceiver<Published>, n: usize) -> Vec<Published> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for publish")
            .expect("publisher dropped");
        out.push(next);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "unexpected extra publish");

    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
