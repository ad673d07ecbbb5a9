use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public projection of a user as embedded in conversations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    /// Live channel key. Users without an email receive no live updates.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UserProfile {
    /// Channel this user listens on, if any
    pub fn channel(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A conversation together with its members and most recent message.
///
/// This is the payload of every `conversation:*` live event and of the
/// conversation list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub latest_message: Option<MessageSummary>,
}

impl ConversationSummary {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.user_ids.contains(&user_id)
    }

    /// First member that is not the viewer.
    ///
    /// Direct conversations are titled after this user. A viewer without an
    /// email matches nobody, so the first member is returned.
    pub fn other_member(&self, viewer_email: Option<&str>) -> Option<&UserProfile> {
        self.users
            .iter()
            .find(|user| viewer_email.is_none() || user.email.as_deref() != viewer_email)
    }

    /// Channels of every member that can receive live events
    pub fn member_channels(&self) -> impl Iterator<Item = &str> {
        self.users.iter().filter_map(UserProfile::channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: None,
            email: email.map(str::to_string),
            image: None,
        }
    }

    fn conversation(users: Vec<UserProfile>) -> ConversationSummary {
        let now = Utc::now();
        ConversationSummary {
            id: Uuid::new_v4(),
            name: None,
            is_group: false,
            created_at: now,
            last_message_at: now,
            user_ids: users.iter().map(|u| u.id).collect(),
            users,
            latest_message: None,
        }
    }

    #[test]
    fn test_other_member_skips_viewer() {
        let conv = conversation(vec![user(Some("me@nova.dev")), user(Some("you@nova.dev"))]);

        let other = conv.other_member(Some("me@nova.dev")).unwrap();
        assert_eq!(other.email.as_deref(), Some("you@nova.dev"));
    }

    #[test]
    fn test_other_member_without_viewer_email() {
        let conv = conversation(vec![user(Some("a@nova.dev")), user(Some("b@nova.dev"))]);

        let other = conv.other_member(None).unwrap();
        assert_eq!(other.email.as_deref(), Some("a@nova.dev"));
    }

    #[test]
    fn test_member_channels_skip_missing_email() {
        let conv = conversation(vec![user(Some("a@nova.dev")), user(None), user(Some(""))]);

        let channels: Vec<&str> = conv.member_channels().collect();
        assert_eq!(channels, vec!["a@nova.dev"]);
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "created_at": "2024-01-01T00:00:00Z",
            "last_message_at": "2024-01-01T00:00:00Z",
        });

        let conv: ConversationSummary = serde_json::from_value(json).unwrap();
        assert!(conv.users.is_empty());
        assert!(!conv.is_group);
        assert!(conv.latest_message.is_none());
    }
}
