//! Reaction → role bindings keyed by (guild, message, emoji)

use super::{Database, StoreResult, from_sql_id, to_sql_id};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

/// One reaction-role binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionRoleBinding {
    pub guild_id: u64,
    pub message_id: u64,
    pub emoji: String,
    pub role_id: u64,
}

impl Database {
    /// Bind a reaction on a message to a role, replacing any existing role
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn bind_reaction_role(
        &self,
        guild_id: u64,
        message_id: u64,
        emoji: &str,
        role_id: u64,
    ) -> StoreResult<()> {
        let key = emoji.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO reaction_roles (guild_id, message_id, emoji, role_id)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(guild_id, message_id, emoji) DO UPDATE SET role_id = excluded.role_id",
                params![
                    to_sql_id(guild_id),
                    to_sql_id(message_id),
                    key,
                    to_sql_id(role_id)
                ],
            )?;
            Ok(())
        })
        .await?;
        debug!(guild_id, message_id, emoji, role_id, "Reaction role bound");
        Ok(())
    }

    /// Remove a binding. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn unbind_reaction_role(
        &self,
        guild_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> StoreResult<bool> {
        let key = emoji.to_string();
        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM reaction_roles WHERE guild_id = ?1 AND message_id = ?2 AND emoji = ?3",
                params![to_sql_id(guild_id), to_sql_id(message_id), key],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    /// The role bound to a reaction, if any
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn lookup_reaction_role(
        &self,
        guild_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> StoreResult<Option<u64>> {
        let key = emoji.to_string();
        self.run(move |conn| {
            let role = conn
                .query_row(
                    "SELECT role_id FROM reaction_roles
                     WHERE guild_id = ?1 AND message_id = ?2 AND emoji = ?3",
                    params![to_sql_id(guild_id), to_sql_id(message_id), key],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(role.map(from_sql_id))
        })
        .await
    }

    /// Every binding on one message, ordered by emoji
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn reaction_roles_for_message(
        &self,
        guild_id: u64,
        message_id: u64,
    ) -> StoreResult<Vec<ReactionRoleBinding>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT emoji, role_id FROM reaction_roles
                 WHERE guild_id = ?1 AND message_id = ?2 ORDER BY emoji",
            )?;
            let rows = stmt.query_map(params![to_sql_id(guild_id), to_sql_id(message_id)], |row| {
                Ok(ReactionRoleBinding {
                    guild_id,
                    message_id,
                    emoji: row.get(0)?,
                    role_id: from_sql_id(row.get(1)?),
                })
            })?;
            let bindings = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(bindings)
        })
        .await
    }

    /// Drop every binding on a message that no longer exists. Returns how many were removed.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn unbind_message(&self, guild_id: u64, message_id: u64) -> StoreResult<usize> {
        let removed = self
            .run(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM reaction_roles WHERE guild_id = ?1 AND message_id = ?2",
                    params![to_sql_id(guild_id), to_sql_id(message_id)],
                )?;
                Ok(removed)
            })
            .await?;
        if removed > 0 {
            debug!(guild_id, message_id, removed, "Reaction roles removed for deleted message");
        }
        Ok(removed)
    }
}
