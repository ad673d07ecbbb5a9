use super::store::{ConversationStore, NewConversation, NewMessage, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use event_schema::{ConversationSummary, MessageSummary, UserProfile};
use std::collections::HashMap;
use tokio_postgres::{GenericClient, Row};
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str = "c.id, c.name, c.is_group, c.created_at, c.last_message_at";

/// [`ConversationStore`] over tokio-postgres with a deadpool connection pool
#[derive(Clone)]
pub struct PgConversationStore {
    db: Pool,
}

impl PgConversationStore {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

struct ConversationRow {
    id: Uuid,
    name: Option<String>,
    is_group: bool,
    created_at: DateTime<Utc>,
    last_message_at: DateTime<Utc>,
}

impl ConversationRow {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            is_group: row.try_get("is_group")?,
            created_at: row.try_get("created_at")?,
            last_message_at: row.try_get("last_message_at")?,
        })
    }
}

fn message_from_row(row: &Row) -> Result<MessageSummary, StoreError> {
    Ok(MessageSummary {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        body: row.try_get("body")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Attach members and latest message to conversation rows, keeping row order.
///
/// Two batched queries regardless of how many conversations are loaded.
async fn hydrate<C: GenericClient>(
    client: &C,
    rows: Vec<ConversationRow>,
) -> Result<Vec<ConversationSummary>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let member_rows = client
        .query(
            r#"
            SELECT cm.conversation_id, u.id, u.name, u.email, u.image
            FROM conversation_members cm
            INNER JOIN users u ON u.id = cm.user_id
            WHERE cm.conversation_id = ANY($1)
            ORDER BY cm.joined_at ASC, u.id ASC
            "#,
            &[&ids],
        )
        .await?;

    let mut members: HashMap<Uuid, Vec<UserProfile>> = HashMap::new();
    for row in &member_rows {
        let conversation_id: Uuid = row.try_get("conversation_id")?;
        members.entry(conversation_id).or_default().push(UserProfile {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image: row.try_get("image")?,
        });
    }

    let latest_rows = client
        .query(
            r#"
            SELECT DISTINCT ON (conversation_id)
                id, conversation_id, sender_id, body, image, created_at
            FROM messages
            WHERE conversation_id = ANY($1)
            ORDER BY conversation_id, created_at DESC
            "#,
            &[&ids],
        )
        .await?;

    let mut latest: HashMap<Uuid, MessageSummary> = HashMap::new();
    for row in &latest_rows {
        let message = message_from_row(row)?;
        latest.insert(message.conversation_id, message);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let users = members.remove(&row.id).unwrap_or_default();
            ConversationSummary {
                id: row.id,
                name: row.name,
                is_group: row.is_group,
                created_at: row.created_at,
                last_message_at: row.last_message_at,
                user_ids: users.iter().map(|u| u.id).collect(),
                users,
                latest_message: latest.remove(&row.id),
            }
        })
        .collect())
}

async fn load_one<C: GenericClient>(
    client: &C,
    id: Uuid,
) -> Result<Option<ConversationSummary>, StoreError> {
    let row = client
        .query_opt(
            &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1"),
            &[&id],
        )
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut loaded = hydrate(client, vec![ConversationRow::from_row(&row)?]).await?;
    Ok(loaded.pop())
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find_with_members(&self, id: Uuid) -> Result<Option<ConversationSummary>, StoreError> {
        let client = self.db.get().await?;
        load_one(&**client, id).await
    }

    async fn delete_for_member(&self, id: Uuid, member_id: Uuid) -> Result<u64, StoreError> {
        let client = self.db.get().await?;

        // Single statement so the membership check and the delete are atomic
        let deleted = client
            .execute(
                r#"
                DELETE FROM conversations c
                WHERE c.id = $1
                  AND EXISTS (
                      SELECT 1 FROM conversation_members cm
                      WHERE cm.conversation_id = c.id AND cm.user_id = $2
                  )
                "#,
                &[&id, &member_id],
            )
            .await?;

        Ok(deleted)
    }

    async fn list_for_member(&self, member_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError> {
        let client = self.db.get().await?;

        let rows = client
            .query(
                &format!(
                    r#"
                    SELECT {CONVERSATION_COLUMNS}
                    FROM conversations c
                    INNER JOIN conversation_members cm ON cm.conversation_id = c.id
                    WHERE cm.user_id = $1
                    ORDER BY c.last_message_at DESC
                    "#
                ),
                &[&member_id],
            )
            .await?;

        let rows = rows
            .iter()
            .map(ConversationRow::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        hydrate(&**client, rows).await
    }

    async fn find_direct_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Option<ConversationSummary>, StoreError> {
        let client = self.db.get().await?;

        let row = client
            .query_opt(
                r#"
                SELECT c.id
                FROM conversations c
                WHERE c.is_group = FALSE
                  AND EXISTS (SELECT 1 FROM conversation_members WHERE conversation_id = c.id AND user_id = $1)
                  AND EXISTS (SELECT 1 FROM conversation_members WHERE conversation_id = c.id AND user_id = $2)
                ORDER BY c.created_at ASC
                LIMIT 1
                "#,
                &[&user_a, &user_b],
            )
            .await?;

        match row {
            Some(row) => {
                let id: Uuid = row.try_get("id")?;
                load_one(&**client, id).await
            }
            None => Ok(None),
        }
    }

    async fn create(&self, new: NewConversation) -> Result<ConversationSummary, StoreError> {
        let mut client = self.db.get().await?;
        let tx = client.transaction().await?;

        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO conversations (id, name, is_group) VALUES ($1, $2, $3)",
            &[&id, &new.name, &new.is_group],
        )
        .await?;

        let inserted = tx
            .execute(
                r#"
                INSERT INTO conversation_members (conversation_id, user_id)
                SELECT $1, u.id FROM users u WHERE u.id = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
                &[&id, &new.member_ids],
            )
            .await? as usize;

        // Dropping the uncommitted transaction rolls back the conversation row
        if inserted != new.member_ids.len() {
            return Err(StoreError::UnknownMembers {
                expected: new.member_ids.len(),
                found: inserted,
            });
        }

        let created = load_one(&*tx, id).await?;
        tx.commit().await?;

        created.ok_or_else(|| StoreError::Corrupt(format!("conversation {id} missing after insert")))
    }

    async fn append_message(
        &self,
        new: NewMessage,
    ) -> Result<Option<(MessageSummary, ConversationSummary)>, StoreError> {
        let mut client = self.db.get().await?;
        let tx = client.transaction().await?;

        let is_member = tx
            .query_opt(
                "SELECT 1 FROM conversation_members WHERE conversation_id = $1 AND user_id = $2",
                &[&new.conversation_id, &new.sender_id],
            )
            .await?
            .is_some();

        if !is_member {
            return Ok(None);
        }

        let row = tx
            .query_one(
                r#"
                INSERT INTO messages (id, conversation_id, sender_id, body, image)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, conversation_id, sender_id, body, image, created_at
                "#,
                &[
                    &Uuid::new_v4(),
                    &new.conversation_id,
                    &new.sender_id,
                    &new.body,
                    &new.image,
                ],
            )
            .await?;
        let message = message_from_row(&row)?;

        tx.execute(
            "UPDATE conversations SET last_message_at = $2 WHERE id = $1",
            &[&new.conversation_id, &message.created_at],
        )
        .await?;

        let conversation = load_one(&*tx, new.conversation_id).await?;
        tx.commit().await?;

        let conversation = conversation.ok_or_else(|| {
            StoreError::Corrupt(format!("conversation {} vanished mid-append", new.conversation_id))
        })?;
        Ok(Some((message, conversation)))
    }
}
