pub mod automod;
pub mod commands;
pub mod config;
pub mod data;
pub mod handlers;
pub mod limits;
pub mod logging;
pub mod modlog;
pub mod reminders;
pub mod starboard;
pub mod store;

pub const BOT_NAME: &str = "guildkeeper";
pub const COMMAND_TARGET: &str = "guildkeeper::command";
pub const ERROR_TARGET: &str = "guildkeeper::error";
pub const EVENT_TARGET: &str = "guildkeeper::handlers";
pub const REMINDER_TARGET: &str = "guildkeeper::reminders";
pub const CONSOLE_TARGET: &str = "guildkeeper";

pub use config::BotConfig;
pub use data::{Data, DataInner};
pub use store::Database;
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
