use crate::services::{ChannelPublisher, ConversationStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    /// Live channel publisher (Redis in production)
    pub publisher: Arc<dyn ChannelPublisher>,
}

impl AppState {
    pub fn new(store: Arc<dyn ConversationStore>, publisher: Arc<dyn ChannelPublisher>) -> Self {
        Self { store, publisher }
    }
}
