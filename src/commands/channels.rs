//! Channel controls: slowmode and locking

use super::{reply_ephemeral, require_guild};
use crate::{Context, Error};
use poise::serenity_prelude::{
    self as serenity, EditChannel, Mentionable, PermissionOverwrite, PermissionOverwriteType,
    Permissions, RoleId,
};

/// Upper bound Discord accepts for slowmode, in seconds
pub const MAX_SLOWMODE_SECS: u16 = 21_600;

/// The `@everyone` overwrite after locking or unlocking
///
/// Other permissions already in the overwrite are kept. Returns `None` when
/// nothing is left and the overwrite should be deleted.
#[must_use]
pub fn everyone_overwrite(
    existing: &[PermissionOverwrite],
    everyone: RoleId,
    locked: bool,
) -> Option<PermissionOverwrite> {
    let kind = PermissionOverwriteType::Role(everyone);
    let (mut allow, mut deny) = existing
        .iter()
        .find(|overwrite| overwrite.kind == kind)
        .map_or((Permissions::empty(), Permissions::empty()), |overwrite| {
            (overwrite.allow, overwrite.deny)
        });

    allow.remove(Permissions::SEND_MESSAGES);
    if locked {
        deny.insert(Permissions::SEND_MESSAGES);
    } else {
        deny.remove(Permissions::SEND_MESSAGES);
    }

    (!allow.is_empty() || !deny.is_empty()).then_some(PermissionOverwrite { allow, deny, kind })
}

/// The channel given, or the one the command was used in
async fn target_channel(
    ctx: Context<'_>,
    channel: Option<serenity::GuildChannel>,
) -> Result<serenity::GuildChannel, Error> {
    match channel {
        Some(channel) => Ok(channel),
        None => ctx
            .guild_channel()
            .await
            .ok_or_else(|| "This command must be used in a server channel".into()),
    }
}

async fn set_locked(
    ctx: Context<'_>,
    channel: Option<serenity::GuildChannel>,
    locked: bool,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let channel = target_channel(ctx, channel).await?;
    let everyone = RoleId::new(guild_id.get());

    match everyone_overwrite(&channel.permission_overwrites, everyone, locked) {
        Some(overwrite) => channel.id.create_permission(ctx.http(), overwrite).await?,
        None => {
            channel
                .id
                .delete_permission(ctx.http(), PermissionOverwriteType::Role(everyone))
                .await?;
        }
    }

    let reply = if locked {
        format!("🔒 {} locked.", channel.mention())
    } else {
        format!("🔓 {} unlocked.", channel.mention())
    };
    ctx.say(reply).await?;
    Ok(())
}

/// Set the slowmode delay of a channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn slowmode(
    ctx: Context<'_>,
    #[description = "Seconds between messages (0 disables)"]
    #[min = 0]
    #[max = 21600]
    seconds: u16,
    #[description = "Channel (defaults to this one)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    if seconds > MAX_SLOWMODE_SECS {
        return reply_ephemeral(ctx, format!("Slowmode must be between 0 and {MAX_SLOWMODE_SECS} seconds.")).await;
    }
    let channel = target_channel(ctx, channel).await?;
    channel
        .id
        .edit(ctx.http(), EditChannel::new().rate_limit_per_user(seconds))
        .await?;

    if seconds == 0 {
        ctx.say(format!("Slowmode disabled in {}", channel.mention()))
            .await?;
    } else {
        ctx.say(format!("Slowmode set to {seconds}s in {}", channel.mention()))
            .await?;
    }
    Ok(())
}

/// Stop @everyone from sending messages in a channel
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn lock(
    ctx: Context<'_>,
    #[description = "Channel (defaults to this one)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    set_locked(ctx, channel, true).await
}

/// Let @everyone send messages in a channel again
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn unlock(
    ctx: Context<'_>,
    #[description = "Channel (defaults to this one)"] channel: Option<serenity::GuildChannel>,
) -> Result<(), Error> {
    set_locked(ctx, channel, false).await
}
