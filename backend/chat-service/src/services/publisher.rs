//! Live event publishing
//!
//! Every user listens on a channel named by their email. Conversation changes
//! are fanned out to each member's channel; publishing is fire-and-forget and
//! never affects the HTTP response.

use async_trait::async_trait;
use event_schema::{EventEnvelope, LiveEvent};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    async fn publish(&self, channel: &str, envelope: &EventEnvelope) -> Result<(), PublishError>;
}

/// Publishes envelopes with Redis `PUBLISH <channel> <json>`
#[derive(Clone)]
pub struct RedisPublisher {
    manager: ConnectionManager,
}

impl RedisPublisher {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub async fn from_url(url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl ChannelPublisher for RedisPublisher {
    async fn publish(&self, channel: &str, envelope: &EventEnvelope) -> Result<(), PublishError> {
        let payload = envelope.to_json()?;
        let mut conn = self.manager.clone();
        let receivers: i64 = conn.publish(channel, payload).await?;

        tracing::trace!(channel, event = %envelope.event, receivers, "live event published");
        Ok(())
    }
}

/// Publish `event` to the channel of every member that has an email.
///
/// Each publish runs on its own task; failures are logged and dropped.
/// Returns the number of channels a publish was started for.
pub fn fan_out(publisher: &Arc<dyn ChannelPublisher>, event: &LiveEvent) -> usize {
    let envelope = match EventEnvelope::try_from(event) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "failed to encode live event");
            return 0;
        }
    };

    let conversation = event.conversation();
    let mut started = 0;

    for user in &conversation.users {
        let Some(channel) = user.channel() else {
            tracing::debug!(user_id = %user.id, event = event.name(), "member has no email, skipping");
            continue;
        };

        let publisher = Arc::clone(publisher);
        let envelope = envelope.clone();
        let channel = channel.to_string();
        let event_name = event.name();
        let conversation_id = conversation.id;

        tokio::spawn(async move {
            if let Err(e) = publisher.publish(&channel, &envelope).await {
                tracing::warn!(
                    %conversation_id,
                    channel = %channel,
                    event = event_name,
                    error = %e,
                    "live event publish failed"
                );
            }
        });
        started += 1;
    }

    started
}
