//! Binding reactions on a message to roles

use super::{reply_ephemeral, require_guild};
use crate::handlers::emoji_key;
use crate::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable, MessageId, ReactionType};
use tracing::warn;

/// Parse a message id typed by a user
#[must_use]
pub fn parse_message_id(input: &str) -> Option<MessageId> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(MessageId::new)
}

/// Normalize emoji input to the form reaction events report
#[must_use]
pub fn normalize_emoji(input: &str) -> (String, Option<ReactionType>) {
    let input = input.trim();
    ReactionType::try_from(input).map_or_else(
        |_| (input.to_string(), None),
        |reaction| (emoji_key(&reaction), Some(reaction)),
    )
}

/// Give a role to members who react to a message in this channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn rr_add(
    ctx: Context<'_>,
    #[description = "ID of a message in this channel"] message_id: String,
    #[description = "Emoji to react with"] emoji: String,
    #[description = "Role to grant"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let Some(message_id) = parse_message_id(&message_id) else {
        return reply_ephemeral(ctx, "Invalid message ID.").await;
    };
    let (key, reaction) = normalize_emoji(&emoji);
    if key.is_empty() {
        return reply_ephemeral(ctx, "Invalid emoji.").await;
    }

    let message = match ctx.channel_id().message(ctx.http(), message_id).await {
        Ok(message) => message,
        Err(_) => return reply_ephemeral(ctx, "Message not found in this channel.").await,
    };

    ctx.data()
        .db
        .bind_reaction_role(guild_id.get(), message_id.get(), &key, role.id.get())
        .await?;

    if let Some(reaction) = reaction {
        if let Err(e) = message.react(ctx.http(), reaction).await {
            warn!(guild_id = guild_id.get(), message_id = message_id.get(), error = %e, "Failed to add reaction");
        }
    }

    ctx.say(format!("Reacting with {key} will now grant {}", role.mention()))
        .await?;
    Ok(())
}

/// Stop granting a role for a reaction
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn rr_remove(
    ctx: Context<'_>,
    #[description = "ID of the message"] message_id: String,
    #[description = "Emoji that was bound"] emoji: String,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let Some(message_id) = parse_message_id(&message_id) else {
        return reply_ephemeral(ctx, "Invalid message ID.").await;
    };
    let (key, _) = normalize_emoji(&emoji);

    let removed = ctx
        .data()
        .db
        .unbind_reaction_role(guild_id.get(), message_id.get(), &key)
        .await?;
    if removed {
        ctx.say("Reaction role removed.").await?;
    } else {
        reply_ephemeral(ctx, "No reaction role is bound to that emoji on that message.").await?;
    }
    Ok(())
}
