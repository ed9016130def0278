//! Guild configuration documents
//!
//! Writes replace the whole document. Callers that change a single key should
//! use [`Database::update_config`] so the read and the write happen inside one
//! acquisition of the gate.

use super::{Database, Document, StoreError, StoreResult, to_sql_id};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

fn read_config(conn: &Connection, guild_id: u64) -> StoreResult<Document> {
    let json: Option<String> = conn
        .query_row(
            "SELECT config_json FROM guild_configs WHERE guild_id = ?1",
            params![to_sql_id(guild_id)],
            |row| row.get(0),
        )
        .optional()?;

    match json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|source| StoreError::CorruptDocument { guild_id, source }),
        None => Ok(Document::new()),
    }
}

fn write_config(conn: &Connection, guild_id: u64, document: &Document) -> StoreResult<()> {
    let json = serde_json::to_string(document).map_err(StoreError::Encode)?;
    conn.execute(
        "INSERT INTO guild_configs (guild_id, config_json) VALUES (?1, ?2)
         ON CONFLICT(guild_id) DO UPDATE SET config_json = excluded.config_json",
        params![to_sql_id(guild_id), json],
    )?;
    Ok(())
}

impl Database {
    /// Get a guild's configuration, or the empty document if none was stored
    ///
    /// # Errors
    /// Returns an error if the store is unavailable or the stored document is corrupt.
    pub async fn get_config(&self, guild_id: u64) -> StoreResult<Document> {
        self.run(move |conn| read_config(conn, guild_id)).await
    }

    /// Replace a guild's configuration
    ///
    /// # Errors
    /// Returns an error if the document cannot be encoded or written.
    pub async fn set_config(&self, guild_id: u64, document: &Document) -> StoreResult<()> {
        let document = document.clone();
        self.run(move |conn| write_config(conn, guild_id, &document))
            .await?;
        debug!(guild_id, "Guild configuration replaced");
        Ok(())
    }

    /// Read, modify and write back a guild's configuration atomically
    ///
    /// The closure runs while the gate is held, so it must not block or call
    /// back into the store. Its return value is passed through.
    ///
    /// # Errors
    /// Returns an error if the read, the write or the commit fails. Nothing
    /// is written in that case.
    pub async fn update_config<F, R>(&self, guild_id: u64, mutate: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Document) -> R + Send + 'static,
        R: Send + 'static,
    {
        let result = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let mut document = read_config(&tx, guild_id)?;
                let result = mutate(&mut document);
                write_config(&tx, guild_id, &document)?;
                tx.commit()?;
                Ok(result)
            })
            .await?;
        debug!(guild_id, "Guild configuration updated");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[tokio::test]
    async fn test_missing_config_is_empty() {
        let db = Database::open_in_memory().unwrap();
        let config = db.get_config(8).await.unwrap();
        assert_eq!(config, Document::new());
    }

    #[tokio::test]
    async fn test_set_then_get_returns_same_document() {
        let db = Database::open_in_memory().unwrap();
        let mut document = Document::new();
        document.set_path("automod.badwords", true);

        db.set_config(7, &document).await.unwrap();

        let stored = db.get_config(7).await.unwrap();
        assert_eq!(stored, document);
        assert_eq!(stored.to_string(), r#"{"automod":{"badwords":true}}"#);
        assert!(db.get_config(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let db = Database::open_in_memory().unwrap();
        let mut first = Document::new();
        first.set_path("welcome_channel", Value::id(1));
        first.set_path("leave_channel", Value::id(2));
        db.set_config(1, &first).await.unwrap();

        let mut second = Document::new();
        second.set_path("welcome_channel", Value::id(3));
        db.set_config(1, &second).await.unwrap();
        db.set_config(1, &second).await.unwrap();

        let stored = db.get_config(1).await.unwrap();
        assert_eq!(stored.get_u64("welcome_channel"), Some(3));
        assert!(stored.get_path("leave_channel").is_none());
    }

    #[tokio::test]
    async fn test_update_config_returns_closure_result() {
        let db = Database::open_in_memory().unwrap();
        let previous = db
            .update_config(3, |doc| doc.set_path("starboard_channel", Value::id(99)))
            .await
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(
            db.get_config(3).await.unwrap().get_u64("starboard_channel"),
            Some(99)
        );
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.run(|conn| {
            conn.execute(
                "INSERT INTO guild_configs (guild_id, config_json) VALUES (5, 'not json')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();
        let result = db.get_config(5).await;
        assert!(matches!(
            result,
            Err(StoreError::CorruptDocument { guild_id: 5, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_serialized() {
        const TASKS: i64 = 64;
        let db = Database::open_in_memory().unwrap();

        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.update_config(11, |doc| {
                    let count = doc.get_i64("stats.counter").unwrap_or(0);
                    doc.set_path("stats.counter", count + 1);
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let config = db.get_config(11).await.unwrap();
        assert_eq!(config.get_i64("stats.counter"), Some(TASKS));
    }

    #[tokio::test]
    async fn test_floats_and_nulls_load_and_stay_writable() {
        let db = Database::open_in_memory().unwrap();
        db.run(|conn| {
            conn.execute(
                r#"INSERT INTO guild_configs (guild_id, config_json)
                   VALUES (6, '{"ratio":1.5,"legacy":null,"count":2}')"#,
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let config = db.get_config(6).await.unwrap();
        assert_eq!(config.get_path("ratio"), Some(&Value::Float(1.5)));
        assert_eq!(config.get_path("legacy"), Some(&Value::Null));
        assert_eq!(config.get_i64("count"), Some(2));

        db.update_config(6, |doc| doc.set_path("welcome_channel", Value::id(4)))
            .await
            .unwrap();
        let stored = db.get_config(6).await.unwrap();
        assert_eq!(
            stored.to_string(),
            r#"{"count":2,"legacy":null,"ratio":1.5,"welcome_channel":4}"#
        );
    }
}
