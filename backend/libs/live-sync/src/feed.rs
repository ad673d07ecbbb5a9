use event_schema::{ConversationSummary, LiveEvent};
use uuid::Uuid;

use crate::reconcile;

/// Route the viewer is sent to when the open conversation disappears
pub const CONVERSATIONS_ROUTE: &str = "/conversations";

/// Client-side router
pub trait Navigator {
    fn push(&mut self, route: &str);
}

/// The conversation list a viewer sees, plus which conversation is open
#[derive(Debug, Clone, Default)]
pub struct ConversationFeed {
    items: Vec<ConversationSummary>,
    open: Option<Uuid>,
}

impl ConversationFeed {
    pub fn new(initial: Vec<ConversationSummary>) -> Self {
        Self {
            items: initial,
            open: None,
        }
    }

    pub fn items(&self) -> &[ConversationSummary] {
        &self.items
    }

    pub fn open_conversation(&self) -> Option<Uuid> {
        self.open
    }

    pub fn set_open_conversation(&mut self, id: Option<Uuid>) {
        self.open = id;
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.open == Some(id)
    }

    /// Replace the list with a freshly fetched one
    pub fn reset(&mut self, items: Vec<ConversationSummary>) {
        self.items = items;
    }

    pub fn apply(&mut self, event: &LiveEvent, navigator: &mut dyn Navigator) {
        match event {
            LiveEvent::New(conversation) => {
                self.items = reconcile::apply_new(&self.items, conversation);
            }
            LiveEvent::Update(conversation) => {
                self.items = reconcile::apply_update(&self.items, conversation);
            }
            LiveEvent::Remove(conversation) => {
                self.items = reconcile::apply_remove(&self.items, conversation.id);

                if self.is_selected(conversation.id) {
                    tracing::debug!(
                        conversation_id = %conversation.id,
                        "open conversation removed, leaving it"
                    );
                    navigator.push(CONVERSATIONS_ROUTE);
                }
            }
        }
    }
}
