//! Repository for toots referenced from IRC.
//!
//! Each toot that is shown in the channel gets a shorthand so users can
//! refer to it in commands without typing the full status id.

use super::DbError;
use sqlx::SqlitePool;

/// A remembered toot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TootRecord {
    pub shorthand: String,
    pub time: i64,
    pub toot_id: String,
    /// Rendered text as last shown on IRC.
    pub content: String,
}

type TootRow = (String, i64, String, String);

fn from_row((shorthand, time, toot_id, content): TootRow) -> TootRecord {
    TootRecord {
        shorthand,
        time,
        toot_id,
        content,
    }
}

/// Repository for toot operations.
pub struct TootRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TootRepository<'a> {
    /// Create a new toot repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a toot by shorthand.
    pub async fn find_by_shorthand(&self, shorthand: &str) -> Result<Option<TootRecord>, DbError> {
        let row = sqlx::query_as::<_, TootRow>(
            r#"
            SELECT shorthand, time, tootid, content
            FROM messages_mastodon
            WHERE shorthand = ?
            "#,
        )
        .bind(shorthand)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Find a toot by its status id.
    pub async fn find_by_toot_id(&self, toot_id: &str) -> Result<Option<TootRecord>, DbError> {
        let row = sqlx::query_as::<_, TootRow>(
            r#"
            SELECT shorthand, time, tootid, content
            FROM messages_mastodon
            WHERE tootid = ?
            "#,
        )
        .bind(toot_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Remember a toot under `shorthand`.
    ///
    /// Fails with [`DbError::ShorthandTaken`] when the shorthand or the toot id
    /// is already stored.
    pub async fn insert(&self, shorthand: &str, toot_id: &str, content: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO messages_mastodon (shorthand, time, tootid, content)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(shorthand)
        .bind(now)
        .bind(toot_id)
        .bind(content)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::ShorthandTaken(shorthand.to_string());
            }
            DbError::from(e)
        })?;

        Ok(())
    }

    /// Replace the stored rendering of a toot.
    pub async fn update_content(&self, shorthand: &str, content: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE messages_mastodon SET content = ? WHERE shorthand = ?")
            .bind(content)
            .bind(shorthand)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Forget a toot. Returns whether a row was removed.
    pub async fn delete(&self, shorthand: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM messages_mastodon WHERE shorthand = ?")
            .bind(shorthand)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
