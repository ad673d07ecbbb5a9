use std::fmt;

/// Handle returned by [`ChannelClient::bind`], needed to unbind the same handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub u64);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding-{}", self.0)
    }
}

/// Client side of the hosted pub/sub provider.
///
/// Channels are named by the recipient's email. The provider delivers named
/// events for subscribed channels to whichever handlers are bound for that
/// event name; delivered events are handed to
/// [`LiveConversationList::handle_raw`](crate::LiveConversationList::handle_raw).
pub trait ChannelClient {
    fn subscribe(&mut self, channel: &str);

    fn unsubscribe(&mut self, channel: &str);

    fn bind(&mut self, event: &'static str) -> BindingId;

    fn unbind(&mut self, event: &'static str, binding: BindingId);
}
