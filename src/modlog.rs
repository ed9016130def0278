//! Posting to a guild's configured log channels
//!
//! A missing or unreachable log channel never fails the action that produced
//! the entry; the failure is logged and dropped.

use crate::EVENT_TARGET;
use crate::store::{Database, LogType};
use serenity::all::{ChannelId, Colour, CreateEmbed, CreateMessage, Http, Timestamp};
use tracing::{debug, warn};

/// Embed for a moderation action against a member
#[must_use]
pub fn moderation_embed(
    title: &str,
    colour: Colour,
    target: &str,
    moderator: &str,
    reason: Option<&str>,
) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .colour(colour)
        .field("Member", target, false)
        .field("Moderator", moderator, false)
        .field("Reason", reason.unwrap_or("No reason provided"), false)
        .timestamp(Timestamp::now())
}

/// Embed for a member or message event
#[must_use]
pub fn event_embed(title: &str, colour: Colour, description: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .colour(colour)
        .description(description)
        .timestamp(Timestamp::now())
}

/// Send an embed to the guild's channel for `log_type`, if one is set
///
/// The channel is looked up first and the store released before sending.
pub async fn send_log(http: &Http, db: &Database, guild_id: u64, log_type: LogType, embed: CreateEmbed) {
    let channel_id = match db.log_channel(guild_id, log_type).await {
        Ok(Some(channel_id)) if channel_id != 0 => channel_id,
        Ok(_) => {
            debug!(target: EVENT_TARGET, guild_id, log_type = %log_type, "No log channel configured");
            return;
        }
        Err(e) => {
            warn!(target: EVENT_TARGET, guild_id, log_type = %log_type, error = %e, "Failed to read log channel");
            return;
        }
    };

    if let Err(e) = ChannelId::new(channel_id)
        .send_message(http, CreateMessage::new().embed(embed))
        .await
    {
        warn!(
            target: EVENT_TARGET,
            guild_id,
            channel_id,
            log_type = %log_type,
            error = %e,
            "Failed to post to log channel"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderation_embed_fields() {
        let embed = moderation_embed("Member Kicked", Colour::ORANGE, "<@1>", "<@2>", None);
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["title"], "Member Kicked");
        assert_eq!(json["fields"][0]["name"], "Member");
        assert_eq!(json["fields"][0]["value"], "<@1>");
        assert_eq!(json["fields"][2]["value"], "No reason provided");
    }

    #[test]
    fn test_moderation_embed_reason() {
        let embed = moderation_embed("Member Banned", Colour::RED, "<@1>", "<@2>", Some("spam"));
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["fields"][2]["value"], "spam");
    }

    #[tokio::test]
    async fn test_send_log_without_channel_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let http = Http::new("");
        // Returns without touching the network
        send_log(&http, &db, 1, LogType::Kicks, event_embed("t", Colour::BLUE, "d")).await;
    }
}
