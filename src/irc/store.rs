//! Message store bridge.
//!
//! Every line that may later be replied to is stored, and the returned id is
//! the only handle ever shown in chat.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::StoreError;

/// Sender and target of a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRef {
    pub sender: String,
    pub target: String,
}

/// Persistence required by the IRC client.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and return its id. Ids are never reused.
    async fn store(&self, sender: &str, target: &str, text: &str) -> Result<String, StoreError>;

    /// Resolve an id back to where the message came from.
    ///
    /// Unknown ids give [`StoreError::NotFound`], store failures
    /// [`StoreError::Unavailable`].
    async fn lookup(&self, id: &str) -> Result<StoredRef, StoreError>;
}

#[async_trait]
impl MessageStore for Database {
    async fn store(&self, sender: &str, target: &str, text: &str) -> Result<String, StoreError> {
        let id = self.irc_messages().store(target, sender, text).await?;
        Ok(id.to_string())
    }

    async fn lookup(&self, id: &str) -> Result<StoredRef, StoreError> {
        let numeric: i64 = id
            .trim()
            .parse()
            .map_err(|_| StoreError::NotFound(id.to_string()))?;

        match self.irc_messages().find(numeric).await? {
            Some(msg) => Ok(StoredRef {
                sender: msg.user,
                target: msg.channel,
            }),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_lookup_round_trips() {
        let db = Database::new(":memory:").await.unwrap();
        for (sender, target, text) in [
            ("alice", "#troet", "hello"),
            ("bob", "troetbot", ""),
            ("c[a]rol", "#troet", "ümlaut ✓"),
        ] {
            let id = db.store(sender, target, text).await.unwrap();
            let found = db.lookup(&id).await.unwrap();
            assert_eq!(found.sender, sender);
            assert_eq!(found.target, target);
        }
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_not_found() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(matches!(db.lookup("999").await, Err(StoreError::NotFound(_))));
        assert!(matches!(db.lookup("abc").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let db = Database::new(":memory:").await.unwrap();
        db.pool().close().await;
        assert!(matches!(db.lookup("1").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            db.store("alice", "#troet", "x").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
