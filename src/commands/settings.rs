//! Per-guild configuration commands

use super::{reply_ephemeral, require_guild};
use crate::automod::AutomodFeature;
use crate::store::{LogType, Value};
use crate::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Document keys for the announcement channels
pub const WELCOME_CHANNEL_KEY: &str = "welcome_channel";
pub const LEAVE_CHANNEL_KEY: &str = "leave_channel";
pub const STARBOARD_CHANNEL_KEY: &str = "starboard_channel";

/// Store a channel id under `key` in the guild document
async fn set_channel(ctx: Context<'_>, key: &'static str, channel: &serenity::GuildChannel) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let channel_id = channel.id.get();
    ctx.data()
        .db
        .update_config(guild_id.get(), move |config| {
            config.set_path(key, Value::id(channel_id));
        })
        .await?;
    Ok(())
}

/// Route a category of log messages to a channel
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn log(
    ctx: Context<'_>,
    #[description = "Log type (bans, kicks, mutes, modactions, joins, leaves, message_delete, message_edit)"]
    log_type: String,
    #[description = "Channel to send these logs to"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let log_type = match log_type.parse::<LogType>() {
        Ok(log_type) => log_type,
        Err(_) => {
            return reply_ephemeral(
                ctx,
                format!("Invalid log type. Valid: {}", LogType::valid_names()),
            )
            .await;
        }
    };

    ctx.data()
        .db
        .set_log_channel(guild_id.get(), log_type, channel.id.get())
        .await?;
    ctx.say(format!("{log_type} logs will be sent to {}", channel.mention()))
        .await?;
    Ok(())
}

/// Set the channel that greets new members
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set_welcome(
    ctx: Context<'_>,
    #[description = "Welcome channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    set_channel(ctx, WELCOME_CHANNEL_KEY, &channel).await?;
    ctx.say(format!("Welcome channel set to {}", channel.mention()))
        .await?;
    Ok(())
}

/// Set the channel that announces departures
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set_leave(
    ctx: Context<'_>,
    #[description = "Leave channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    set_channel(ctx, LEAVE_CHANNEL_KEY, &channel).await?;
    ctx.say(format!("Leave channel set to {}", channel.mention()))
        .await?;
    Ok(())
}

/// Set the channel starred messages are reposted to
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set_starboard(
    ctx: Context<'_>,
    #[description = "Starboard channel"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    set_channel(ctx, STARBOARD_CHANNEL_KEY, &channel).await?;
    ctx.say(format!("Starboard channel set to {}", channel.mention()))
        .await?;
    Ok(())
}

/// Turn an automod filter on or off
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn automod(
    ctx: Context<'_>,
    #[description = "Filter (badwords, invites, links)"] feature: String,
    #[description = "Enable or disable"] enabled: bool,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let feature = match feature.parse::<AutomodFeature>() {
        Ok(feature) => feature,
        Err(message) => return reply_ephemeral(ctx, message).await,
    };

    let path = feature.config_path();
    ctx.data()
        .db
        .update_config(guild_id.get(), move |config| {
            config.set_path(&path, enabled);
        })
        .await?;

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.say(format!("Automod {feature} {state}")).await?;
    Ok(())
}
