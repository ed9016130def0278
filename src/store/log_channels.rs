//! Per-guild routing of moderation and activity logs to channels

use super::{Database, StoreResult, from_sql_id, to_sql_id};
use rusqlite::{OptionalExtension, params};
use std::fmt;
use std::str::FromStr;

/// Category of log message a guild can route to a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Bans,
    Kicks,
    Mutes,
    ModActions,
    Joins,
    Leaves,
    MessageDelete,
    MessageEdit,
}

impl LogType {
    pub const ALL: [Self; 8] = [
        Self::Bans,
        Self::Kicks,
        Self::Mutes,
        Self::ModActions,
        Self::Joins,
        Self::Leaves,
        Self::MessageDelete,
        Self::MessageEdit,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bans => "bans",
            Self::Kicks => "kicks",
            Self::Mutes => "mutes",
            Self::ModActions => "modactions",
            Self::Joins => "joins",
            Self::Leaves => "leaves",
            Self::MessageDelete => "message_delete",
            Self::MessageEdit => "message_edit",
        }
    }

    /// Comma-separated list of valid names, for error replies
    #[must_use]
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|log_type| log_type.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a log type name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid log type `{0}`")]
pub struct UnknownLogType(pub String);

impl FromStr for LogType {
    type Err = UnknownLogType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|log_type| log_type.as_str() == name)
            .ok_or(UnknownLogType(name))
    }
}

impl Database {
    /// Route a log type to a channel, replacing any previous route
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn set_log_channel(
        &self,
        guild_id: u64,
        log_type: LogType,
        channel_id: u64,
    ) -> StoreResult<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO logs (guild_id, log_type, channel_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(guild_id, log_type) DO UPDATE SET channel_id = excluded.channel_id",
                params![to_sql_id(guild_id), log_type.as_str(), to_sql_id(channel_id)],
            )?;
            Ok(())
        })
        .await
    }

    /// The channel a log type is routed to, if configured
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn log_channel(&self, guild_id: u64, log_type: LogType) -> StoreResult<Option<u64>> {
        self.run(move |conn| {
            let channel = conn
                .query_row(
                    "SELECT channel_id FROM logs WHERE guild_id = ?1 AND log_type = ?2",
                    params![to_sql_id(guild_id), log_type.as_str()],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(channel.map(from_sql_id))
        })
        .await
    }
}
