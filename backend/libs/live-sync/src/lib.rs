//! # Live Sync
//!
//! Keeps a client-held conversation list in step with the live events the
//! chat service publishes on each user's channel.
//!
//! ## Modules
//! - `reconcile`: pure list transformations for new/update/remove events
//! - `feed`: the list plus the open conversation and its navigation side-effect
//! - `channel`: the channel client contract (subscribe, bind, unbind)
//! - `controller`: subscription lifecycle tied to the viewer's channel key

pub mod channel;
pub mod controller;
pub mod feed;
pub mod reconcile;

pub use channel::{BindingId, ChannelClient};
pub use controller::{LiveConversationList, SyncError};
pub use feed::{ConversationFeed, Navigator, CONVERSATIONS_ROUTE};
