//! One-shot reminder queue
//!
//! [`Database::drain_due`] selects and deletes due reminders in one
//! transaction, so each reminder is handed to exactly one caller. Delivery
//! happens afterwards and is the caller's concern.

use super::{Database, StoreResult, from_sql_id, to_sql_id};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A reminder waiting in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: i64,
    pub owner_id: u64,
    /// Unix epoch seconds, UTC
    pub due: i64,
    pub payload: String,
}

impl Database {
    /// Queue a reminder and return its id
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn schedule_reminder(
        &self,
        owner_id: u64,
        due: i64,
        payload: &str,
    ) -> StoreResult<i64> {
        let payload = payload.to_string();
        let id = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO reminders (user_id, remind_time, message) VALUES (?1, ?2, ?3)",
                    params![to_sql_id(owner_id), due, payload],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        debug!(task_id = id, owner_id, due, "Reminder scheduled");
        Ok(id)
    }

    /// Remove and return every reminder with `due <= now`, oldest first
    ///
    /// # Errors
    /// Returns an error if the store is unavailable. On error nothing is removed.
    pub async fn drain_due(&self, now: i64) -> StoreResult<Vec<ScheduledTask>> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let tasks = {
                let mut stmt = tx.prepare(
                    "SELECT id, user_id, remind_time, message FROM reminders
                     WHERE remind_time <= ?1 ORDER BY remind_time, id",
                )?;
                let rows = stmt.query_map(params![now], |row| {
                    Ok(ScheduledTask {
                        id: row.get(0)?,
                        owner_id: from_sql_id(row.get(1)?),
                        due: row.get(2)?,
                        payload: row.get(3)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            if !tasks.is_empty() {
                tx.execute("DELETE FROM reminders WHERE remind_time <= ?1", params![now])?;
            }
            tx.commit()?;
            Ok(tasks)
        })
        .await
    }

    /// Pending reminders for one user, soonest first
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn pending_reminders(&self, owner_id: u64) -> StoreResult<Vec<ScheduledTask>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, remind_time, message FROM reminders
                 WHERE user_id = ?1 ORDER BY remind_time, id",
            )?;
            let rows = stmt.query_map(params![to_sql_id(owner_id)], |row| {
                Ok(ScheduledTask {
                    id: row.get(0)?,
                    owner_id,
                    due: row.get(1)?,
                    payload: row.get(2)?,
                })
            })?;
            let tasks = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
        .await
    }
}
