//! Repository for messages seen or sent on the IRC side.

use super::DbError;
use sqlx::SqlitePool;

/// A stored IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIrcMessage {
    pub id: i64,
    pub time: i64,
    /// Channel or nick the message was addressed to.
    pub channel: String,
    /// Nick of the sender.
    pub user: String,
    pub message: String,
}

/// Repository for IRC message operations.
pub struct IrcMessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> IrcMessageRepository<'a> {
    /// Create a new IRC message repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a message and return its id.
    pub async fn store(&self, channel: &str, user: &str, message: &str) -> Result<i64, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO messages_irc (time, channel, user, message)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(now)
        .bind(channel)
        .bind(user)
        .bind(message)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Find a message by id.
    pub async fn find(&self, id: i64) -> Result<Option<StoredIrcMessage>, DbError> {
        let row = sqlx::query_as::<_, (i64, i64, String, String, String)>(
            r#"
            SELECT id, time, channel, user, message
            FROM messages_irc
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, time, channel, user, message)| StoredIrcMessage {
            id,
            time,
            channel,
            user,
            message,
        }))
    }
}
