use std::{ops::Deref, sync::Arc};

use crate::automod::Automod;
use crate::config::BotConfig;
use crate::starboard::Starboard;
use crate::store::{Database, StoreResult};

/// Centralized data structure for the bot, shared by commands and event handlers
#[derive(Clone)]
pub struct Data(pub Arc<DataInner>);

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("db", &self.db)
            .field("config", &self.config)
            .field("starboard", &self.starboard)
            .finish_non_exhaustive()
    }
}

impl Deref for Data {
    type Target = DataInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Data {
    /// Build the bot data around an opened database
    #[must_use]
    pub fn new(db: Database, config: BotConfig) -> Self {
        Self(Arc::new(DataInner::new(db, config)))
    }

    /// Open the configured database and build the bot data
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(config: BotConfig) -> StoreResult<Self> {
        let db = Database::open(&config.database_path)?;
        Ok(Self::new(db, config))
    }
}

pub struct DataInner {
    /// Gated storage; every read and write goes through it
    pub db: Database,
    pub config: BotConfig,
    pub automod: Automod,
    pub starboard: Starboard,
}

impl DataInner {
    #[must_use]
    pub fn new(db: Database, config: BotConfig) -> Self {
        let automod = Automod::new(&config.badwords);
        let starboard = Starboard::new(&config.starboard_emoji, config.starboard_threshold);
        Self {
            db,
            config,
            automod,
            starboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data() -> Data {
        Data::new(Database::open_in_memory().unwrap(), BotConfig::default())
    }

    #[test]
    fn test_data_debug_impl() {
        let debug_output = format!("{:?}", test_data());
        assert!(debug_output.contains("Data"));
        assert!(debug_output.contains("db"));
        assert!(debug_output.contains("config"));
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let data = test_data();
        let clone = data.clone();
        data.db.set_custom_command(1, "hi", "hello").await.unwrap();
        assert_eq!(
            clone.db.custom_command(1, "hi").await.unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_open_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = BotConfig {
            database_path: dir.path().join("bot.db"),
            ..BotConfig::default()
        };
        let data = Data::open(config).unwrap();
        assert!(data.config.database_path.exists());
    }
}
