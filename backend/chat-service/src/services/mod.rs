pub mod postgres_store;
pub mod publisher;
pub mod store;

pub use postgres_store::PgConversationStore;
pub use publisher::{fan_out, ChannelPublisher, PublishError, RedisPublisher};
pub use store::{ConversationStore, NewConversation, NewMessage, StoreError};
