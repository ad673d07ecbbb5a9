//! List reconciliation against live conversation events.
//!
//! Every function takes the current list by reference and returns the next
//! one. Events may arrive duplicated or out of order: an update for an unknown
//! conversation is dropped, and a create after a remove brings the entry back.

use event_schema::ConversationSummary;
use uuid::Uuid;

pub fn contains(items: &[ConversationSummary], id: Uuid) -> bool {
    items.iter().any(|item| item.id == id)
}

/// `conversation:new` - prepend unless already present
pub fn apply_new(items: &[ConversationSummary], conversation: &ConversationSummary) -> Vec<ConversationSummary> {
    if contains(items, conversation.id) {
        return items.to_vec();
    }

    let mut next = Vec::with_capacity(items.len() + 1);
    next.push(conversation.clone());
    next.extend_from_slice(items);
    next
}

/// `conversation:update` - refresh the latest message of the matching entry
pub fn apply_update(
    items: &[ConversationSummary],
    conversation: &ConversationSummary,
) -> Vec<ConversationSummary> {
    items
        .iter()
        .map(|item| {
            if item.id != conversation.id {
                return item.clone();
            }
            ConversationSummary {
                latest_message: conversation.latest_message.clone(),
                last_message_at: conversation.last_message_at,
                ..item.clone()
            }
        })
        .collect()
}

/// `conversation:remove` - drop the matching entry, keeping the order of the rest
pub fn apply_remove(items: &[ConversationSummary], id: Uuid) -> Vec<ConversationSummary> {
    items.iter().filter(|item| item.id != id).cloned().collect()
}
