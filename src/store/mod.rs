//! Persistent storage for guild configuration, reaction roles, the infraction
//! ledger and reminders
//!
//! All tables live in one SQLite file. The connection is not safe for
//! interleaved use, so every operation goes through [`Database`], which holds
//! it behind a single async mutex. Each public method locks, runs its whole
//! logical operation (including any read-modify-write) and unlocks before
//! returning. Nothing outside this module can reach the connection, and no
//! operation calls another gated operation while holding the lock.
//!
//! Callers must perform external side effects (Discord calls, direct
//! messages) only after the store call has returned.

mod configs;
mod custom_commands;
pub mod document;
mod error;
pub mod ledger;
pub mod log_channels;
mod reaction_roles;
pub mod reminders;

pub use document::{Document, Value};
pub use error::{StoreError, StoreResult};
pub use ledger::{InfractionKind, InfractionRecord, NewInfraction};
pub use log_channels::LogType;
pub use reaction_roles::ReactionRoleBinding;
pub use reminders::ScheduledTask;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// How long SQLite itself waits on a locked database file
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS guild_configs (
        guild_id INTEGER PRIMARY KEY,
        config_json TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS reaction_roles (
        guild_id INTEGER NOT NULL,
        message_id INTEGER NOT NULL,
        emoji TEXT NOT NULL,
        role_id INTEGER NOT NULL,
        PRIMARY KEY (guild_id, message_id, emoji)
    );
    CREATE TABLE IF NOT EXISTS infractions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        mod_id INTEGER NOT NULL,
        action TEXT NOT NULL,
        reason TEXT,
        timestamp INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_infractions_subject
        ON infractions (guild_id, user_id, timestamp);
    CREATE TABLE IF NOT EXISTS reminders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        remind_time INTEGER NOT NULL,
        message TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (remind_time);
    CREATE TABLE IF NOT EXISTS logs (
        guild_id INTEGER NOT NULL,
        log_type TEXT NOT NULL,
        channel_id INTEGER NOT NULL,
        PRIMARY KEY (guild_id, log_type)
    );
    CREATE TABLE IF NOT EXISTS custom_commands (
        guild_id INTEGER NOT NULL,
        command_name TEXT NOT NULL,
        response TEXT NOT NULL,
        PRIMARY KEY (guild_id, command_name)
    );
";

/// Shared handle to the bot's storage
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database file at `path`
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the file
    /// cannot be opened, or the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let database = Self::from_connection(conn)?;
        info!(path = %path.display(), "Database opened");
        Ok(database)
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database or apply the schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run one operation against the connection while holding the gate
    ///
    /// The operation runs on the blocking pool so disk I/O stays off the
    /// async workers. The gate travels with it and is released only when the
    /// operation has finished, even if the calling future is dropped.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = Arc::clone(&self.conn).lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut conn)).await?
    }
}

/// Platform ids are unsigned 64-bit; SQLite integers are signed. Store the bits as-is.
#[allow(clippy::cast_possible_wrap)]
const fn to_sql_id(id: u64) -> i64 {
    id as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_sql_id(id: i64) -> u64 {
    id as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_id_round_trip() {
        for id in [0, 1, 1_234_567_890_123_456_789, u64::MAX] {
            assert_eq!(from_sql_id(to_sql_id(id)), id);
        }
    }

    #[tokio::test]
    async fn test_open_in_memory_creates_schema() {
        let db = Database::open_in_memory().expect("Failed to open database");
        let tables: i64 = db
            .run(|conn| {
                let count = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                     ('guild_configs', 'reaction_roles', 'infractions', 'reminders', 'logs', 'custom_commands')",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await
            .expect("Failed to query schema");
        assert_eq!(tables, 6);
    }

    #[tokio::test]
    async fn test_gate_released_after_dropped_caller() {
        let db = Database::open_in_memory().unwrap();
        let slow = db.run(|conn| {
            conn.execute_batch("CREATE TABLE scratch (n INTEGER)")?;
            std::thread::sleep(std::time::Duration::from_millis(50));
            conn.execute("INSERT INTO scratch (n) VALUES (1)", [])?;
            Ok(())
        });
        // Abandon the call after it has taken the gate
        let _ = tokio::time::timeout(std::time::Duration::from_millis(5), slow).await;

        let rows: i64 = db
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM scratch", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("bot.db");
        let _db = Database::open(&path).expect("Failed to open database");
        assert!(path.exists());
    }
}
