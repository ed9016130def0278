//! Guild-defined text commands: a message equal to the command name gets the stored response

use super::{Database, StoreResult, to_sql_id};
use rusqlite::{OptionalExtension, params};

/// Command names are matched case-insensitively
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Database {
    /// Create or replace a custom command
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn set_custom_command(
        &self,
        guild_id: u64,
        name: &str,
        response: &str,
    ) -> StoreResult<()> {
        let name = normalize(name);
        let response = response.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO custom_commands (guild_id, command_name, response) VALUES (?1, ?2, ?3)
                 ON CONFLICT(guild_id, command_name) DO UPDATE SET response = excluded.response",
                params![to_sql_id(guild_id), name, response],
            )?;
            Ok(())
        })
        .await
    }

    /// The response for a custom command, if one is defined
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn custom_command(&self, guild_id: u64, name: &str) -> StoreResult<Option<String>> {
        let name = normalize(name);
        self.run(move |conn| {
            let response = conn
                .query_row(
                    "SELECT response FROM custom_commands WHERE guild_id = ?1 AND command_name = ?2",
                    params![to_sql_id(guild_id), name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(response)
        })
        .await
    }

    /// Delete a custom command. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn remove_custom_command(&self, guild_id: u64, name: &str) -> StoreResult<bool> {
        let name = normalize(name);
        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM custom_commands WHERE guild_id = ?1 AND command_name = ?2",
                params![to_sql_id(guild_id), name],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    /// Names of all custom commands in a guild, sorted
    ///
    /// # Errors
    /// Returns an error if the store is unavailable.
    pub async fn custom_commands(&self, guild_id: u64) -> StoreResult<Vec<String>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT command_name FROM custom_commands WHERE guild_id = ?1 ORDER BY command_name",
            )?;
            let rows = stmt.query_map(params![to_sql_id(guild_id)], |row| row.get(0))?;
            let names = rows.collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_command_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        db.set_custom_command(1, "Rules", "Be nice.").await.unwrap();
        db.set_custom_command(1, "faq", "Read the docs.").await.unwrap();

        assert_eq!(
            db.custom_command(1, "rules").await.unwrap().as_deref(),
            Some("Be nice.")
        );
        assert_eq!(db.custom_command(2, "rules").await.unwrap(), None);
        assert_eq!(db.custom_commands(1).await.unwrap(), vec!["faq", "rules"]);

        db.set_custom_command(1, "RULES", "Be kind.").await.unwrap();
        assert_eq!(
            db.custom_command(1, "Rules").await.unwrap().as_deref(),
            Some("Be kind.")
        );

        assert!(db.remove_custom_command(1, "rules").await.unwrap());
        assert!(!db.remove_custom_command(1, "rules").await.unwrap());
        assert_eq!(db.custom_command(1, "rules").await.unwrap(), None);
    }
}
