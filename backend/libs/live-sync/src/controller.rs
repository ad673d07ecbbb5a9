//! Live conversation list bound to the viewer's channel.
//!
//! The channel key (the viewer's email) is a scoped resource: setting a new
//! key releases the previous subscription and its handler bindings before
//! acquiring the new ones. Setting the same key again, or unmounting twice,
//! does nothing.

use event_schema::{ConversationSummary, EventError, LiveEvent};
use thiserror::Error;
use uuid::Uuid;

use crate::channel::{BindingId, ChannelClient};
use crate::feed::{ConversationFeed, Navigator};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error("malformed event json: {0}")]
    Json(#[from] serde_json::Error),
}

struct ActiveSubscription {
    channel: String,
    bindings: Vec<(&'static str, BindingId)>,
}

pub struct LiveConversationList<C: ChannelClient, N: Navigator> {
    client: C,
    navigator: N,
    feed: ConversationFeed,
    active: Option<ActiveSubscription>,
}

impl<C: ChannelClient, N: Navigator> LiveConversationList<C, N> {
    pub fn new(client: C, navigator: N, initial: Vec<ConversationSummary>) -> Self {
        Self {
            client,
            navigator,
            feed: ConversationFeed::new(initial),
            active: None,
        }
    }

    pub fn items(&self) -> &[ConversationSummary] {
        self.feed.items()
    }

    pub fn feed(&self) -> &ConversationFeed {
        &self.feed
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Channel currently subscribed, if mounted
    pub fn channel(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.channel.as_str())
    }

    pub fn set_open_conversation(&mut self, id: Option<Uuid>) {
        self.feed.set_open_conversation(id);
    }

    /// Replace the list after a full refetch. The subscription is kept.
    pub fn refresh(&mut self, items: Vec<ConversationSummary>) {
        self.feed.reset(items);
    }

    /// Mount (or re-key) the list on the viewer's channel.
    ///
    /// `None` or an empty key means the viewer has no email; any existing
    /// subscription is released and nothing new is acquired.
    pub fn set_channel_key(&mut self, key: Option<&str>) {
        let key = key.filter(|k| !k.is_empty());

        if self.channel() == key {
            return;
        }

        self.unmount();

        let Some(channel) = key else {
            return;
        };

        self.client.subscribe(channel);
        let bindings = LiveEvent::NAMES
            .into_iter()
            .map(|event| (event, self.client.bind(event)))
            .collect();

        tracing::debug!(channel, "subscribed to live conversation events");
        self.active = Some(ActiveSubscription {
            channel: channel.to_string(),
            bindings,
        });
    }

    /// Release the subscription and every handler bound for it
    pub fn unmount(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.client.unsubscribe(&active.channel);
        for (event, binding) in active.bindings {
            self.client.unbind(event, binding);
        }
        tracing::debug!(channel = %active.channel, "unsubscribed from live conversation events");
    }

    /// Apply an already decoded event delivered on `channel`
    pub fn handle(&mut self, channel: &str, event: &LiveEvent) {
        if self.channel() != Some(channel) {
            tracing::trace!(channel, event = event.name(), "dropping event for inactive channel");
            return;
        }
        self.feed.apply(event, &mut self.navigator);
    }

    /// Decode and apply a named event with a JSON payload as the provider delivers it
    ///
    /// Payloads on an inactive channel are not decoded.
    pub fn handle_raw(&mut self, channel: &str, event: &str, payload: &str) -> Result<(), SyncError> {
        if self.channel() != Some(channel) {
            tracing::trace!(channel, event, "dropping raw event for inactive channel");
            return Ok(());
        }
        let data: serde_json::Value = serde_json::from_str(payload)?;
        let event = LiveEvent::from_parts(event, data)?;
        self.handle(channel, &event);
        Ok(())
    }
}

impl<C: ChannelClient, N: Navigator> Drop for LiveConversationList<C, N> {
    fn drop(&mut self) {
        self.unmount();
    }
}
