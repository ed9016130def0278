//! Append-only ledger of moderation actions
//!
//! Records are never updated or deleted. Reads are always scoped to one
//! (guild, user) pair and come back newest first, ties broken by descending id.

use super::{Database, StoreResult, from_sql_id, to_sql_id};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Kind of moderation action recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfractionKind {
    Warn,
    Kick,
    Ban,
    Mute,
    Unban,
    Unmute,
    /// Anything else, stored under its own name
    Other(String),
}

impl InfractionKind {
    /// Storage name of this kind
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warn => "warn",
            Self::Kick => "kick",
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Unban => "unban",
            Self::Unmute => "unmute",
            Self::Other(name) => name,
        }
    }

    /// Parse a storage name. Unknown names become [`InfractionKind::Other`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "warn" => Self::Warn,
            "kick" => Self::Kick,
            "ban" => Self::Ban,
            "mute" => Self::Mute,
            "unban" => Self::Unban,
            "unmute" => Self::Unmute,
            _ => Self::Other(name.to_string()),
        }
    }
}

impl fmt::Display for InfractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => write!(f, "Warning"),
            Self::Kick => write!(f, "Kick"),
            Self::Ban => write!(f, "Ban"),
            Self::Mute => write!(f, "Mute"),
            Self::Unban => write!(f, "Unban"),
            Self::Unmute => write!(f, "Unmute"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// An infraction about to be appended
#[derive(Debug, Clone)]
pub struct NewInfraction {
    pub guild_id: u64,
    pub user_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionKind,
    pub reason: Option<String>,
    /// Unix epoch seconds, UTC
    pub timestamp: i64,
}

impl NewInfraction {
    /// Create an infraction stamped with the current time
    #[must_use]
    pub fn now(guild_id: u64, user_id: u64, moderator_id: u64, kind: InfractionKind) -> Self {
        Self {
            guild_id,
            user_id,
            moderator_id,
            kind,
            reason: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub const fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A stored infraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionRecord {
    pub id: i64,
    pub guild_id: u64,
    pub user_id: u64,
    pub moderator_id: u64,
    pub kind: InfractionKind,
    pub reason: Option<String>,
    pub timestamp: i64,
}

impl fmt::Display for InfractionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} by <@{}> at <t:{}:f>: {}",
            self.id,
            self.kind,
            self.moderator_id,
            self.timestamp,
            self.reason.as_deref().unwrap_or("No reason provided")
        )
    }
}

impl Database {
    /// Append an infraction and return it with its assigned id
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn append_infraction(&self, infraction: NewInfraction) -> StoreResult<InfractionRecord> {
        let row = infraction.clone();
        let id = self
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO infractions (guild_id, user_id, mod_id, action, reason, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        to_sql_id(row.guild_id),
                        to_sql_id(row.user_id),
                        to_sql_id(row.moderator_id),
                        row.kind.as_str(),
                        row.reason,
                        row.timestamp
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        info!(
            infraction_id = id,
            guild_id = infraction.guild_id,
            user_id = infraction.user_id,
            moderator_id = infraction.moderator_id,
            action = %infraction.kind.as_str(),
            "Infraction recorded"
        );

        Ok(InfractionRecord {
            id,
            guild_id: infraction.guild_id,
            user_id: infraction.user_id,
            moderator_id: infraction.moderator_id,
            kind: infraction.kind,
            reason: infraction.reason,
            timestamp: infraction.timestamp,
        })
    }

    /// A user's infractions in a guild, newest first
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn list_infractions(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> StoreResult<Vec<InfractionRecord>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, mod_id, action, reason, timestamp FROM infractions
                 WHERE guild_id = ?1 AND user_id = ?2
                 ORDER BY timestamp DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![to_sql_id(guild_id), to_sql_id(user_id)], |row| {
                let action: String = row.get(2)?;
                Ok(InfractionRecord {
                    id: row.get(0)?,
                    guild_id,
                    user_id,
                    moderator_id: from_sql_id(row.get(1)?),
                    kind: InfractionKind::parse(&action),
                    reason: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?;
            let records = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
    }
}
