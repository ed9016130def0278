//! Moderation commands. Each action is recorded in the ledger and routed to the guild's log channel.

use super::{reply_ephemeral, require_guild};
use crate::limits::{EMBED_DESCRIPTION_LIMIT, join_within, truncate};
use crate::modlog::{moderation_embed, send_log};
use crate::reminders::now_unix;
use crate::store::{InfractionKind, InfractionRecord, LogType, NewInfraction};
use crate::{Context, Error};
use poise::serenity_prelude::{self as serenity, Colour, CreateEmbed, GuildId, Mentionable, Timestamp};

/// Longest timeout Discord accepts, in minutes (28 days)
pub const MAX_MUTE_MINUTES: u32 = 40_320;

const DEFAULT_MUTE_MINUTES: u32 = 60;

/// Entries shown by `/infractions`
const INFRACTION_PAGE: usize = 10;

/// Longest single entry in the `/infractions` listing
const INFRACTION_LINE_LIMIT: usize = 400;

/// Render the newest infractions as an embed description
#[must_use]
pub fn format_infractions(records: &[InfractionRecord]) -> String {
    let lines = records
        .iter()
        .take(INFRACTION_PAGE)
        .map(|record| truncate(&record.to_string(), INFRACTION_LINE_LIMIT))
        .collect::<Vec<_>>();
    join_within(&lines, records.len(), EMBED_DESCRIPTION_LIMIT)
}

/// Record the action and post it to the log channel for `log_type`
#[allow(clippy::too_many_arguments)]
async fn record_action(
    ctx: Context<'_>,
    guild_id: GuildId,
    target: &serenity::User,
    kind: InfractionKind,
    reason: Option<&str>,
    log_type: LogType,
    title: &str,
    colour: Colour,
) -> Result<(), Error> {
    let mut infraction = NewInfraction::now(guild_id.get(), target.id.get(), ctx.author().id.get(), kind);
    if let Some(reason) = reason {
        infraction = infraction.with_reason(reason);
    }
    ctx.data().db.append_infraction(infraction).await?;

    let embed = moderation_embed(
        title,
        colour,
        &target.mention().to_string(),
        &ctx.author().mention().to_string(),
        reason,
    );
    send_log(ctx.http(), &ctx.data().db, guild_id.get(), log_type, embed).await;
    Ok(())
}

/// Kick a member from the server
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "Member to kick"] member: serenity::Member,
    #[description = "Reason for the kick"]
    #[max_length = 512]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if member.user.id == ctx.author().id {
        return reply_ephemeral(ctx, "You cannot kick yourself.").await;
    }

    let audit_reason = reason.as_deref().unwrap_or("No reason provided");
    guild_id
        .kick_with_reason(ctx.http(), member.user.id, audit_reason)
        .await?;
    record_action(
        ctx,
        guild_id,
        &member.user,
        InfractionKind::Kick,
        reason.as_deref(),
        LogType::Kicks,
        "Member Kicked",
        Colour::ORANGE,
    )
    .await?;

    ctx.say(format!("Kicked {} | Reason: {audit_reason}", member.mention()))
        .await?;
    Ok(())
}

/// Ban a member from the server
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "Member to ban"] member: serenity::Member,
    #[description = "Reason for the ban"]
    #[max_length = 512]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if member.user.id == ctx.author().id {
        return reply_ephemeral(ctx, "You cannot ban yourself.").await;
    }

    let audit_reason = reason.as_deref().unwrap_or("No reason provided");
    guild_id
        .ban_with_reason(ctx.http(), member.user.id, 0, audit_reason)
        .await?;
    record_action(
        ctx,
        guild_id,
        &member.user,
        InfractionKind::Ban,
        reason.as_deref(),
        LogType::Bans,
        "Member Banned",
        Colour::RED,
    )
    .await?;

    ctx.say(format!("Banned {} | Reason: {audit_reason}", member.mention()))
        .await?;
    Ok(())
}

/// Lift a ban
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "User to unban"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if let Err(e) = guild_id.unban(ctx.http(), user.id).await {
        tracing::debug!(error = %e, user_id = user.id.get(), "Unban failed");
        return reply_ephemeral(ctx, "That user is not banned.").await;
    }
    record_action(
        ctx,
        guild_id,
        &user,
        InfractionKind::Unban,
        None,
        LogType::Bans,
        "Member Unbanned",
        Colour::DARK_GREEN,
    )
    .await?;

    ctx.say(format!("Unbanned {}", user.tag())).await?;
    Ok(())
}

/// Time out a member
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn mute(
    ctx: Context<'_>,
    #[description = "Member to mute"] mut member: serenity::Member,
    #[description = "Minutes to mute for (default 60)"]
    #[min = 1]
    #[max = 40320]
    minutes: Option<u32>,
    #[description = "Reason for the mute"]
    #[max_length = 512]
    reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if member.user.id == ctx.author().id {
        return reply_ephemeral(ctx, "You cannot mute yourself.").await;
    }
    let minutes = minutes.unwrap_or(DEFAULT_MUTE_MINUTES);
    if minutes == 0 || minutes > MAX_MUTE_MINUTES {
        return reply_ephemeral(ctx, format!("Minutes must be between 1 and {MAX_MUTE_MINUTES}.")).await;
    }

    let until = Timestamp::from_unix_timestamp(now_unix() + i64::from(minutes) * 60)?;
    member
        .disable_communication_until_datetime(ctx.http(), until)
        .await?;
    record_action(
        ctx,
        guild_id,
        &member.user,
        InfractionKind::Mute,
        reason.as_deref(),
        LogType::Mutes,
        "Member Muted",
        Colour::DARK_ORANGE,
    )
    .await?;

    ctx.say(format!("Muted {} for {minutes} minute(s)", member.mention()))
        .await?;
    Ok(())
}

/// Remove a member's timeout
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn unmute(
    ctx: Context<'_>,
    #[description = "Member to unmute"] mut member: serenity::Member,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    member.enable_communication(ctx.http()).await?;
    record_action(
        ctx,
        guild_id,
        &member.user,
        InfractionKind::Unmute,
        None,
        LogType::Mutes,
        "Member Unmuted",
        Colour::DARK_GREEN,
    )
    .await?;

    ctx.say(format!("Unmuted {}", member.mention())).await?;
    Ok(())
}

/// Record a warning against a member
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "Member to warn"] member: serenity::Member,
    #[description = "Reason for the warning"]
    #[max_length = 512]
    reason: String,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    record_action(
        ctx,
        guild_id,
        &member.user,
        InfractionKind::Warn,
        Some(&reason),
        LogType::ModActions,
        "Member Warned",
        Colour::GOLD,
    )
    .await?;

    ctx.say(format!("Warned {} | Reason: {reason}", member.mention()))
        .await?;
    Ok(())
}

/// Show a user's recorded infractions, newest first
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn infractions(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let records = ctx
        .data()
        .db
        .list_infractions(guild_id.get(), user.id.get())
        .await?;

    if records.is_empty() {
        return reply_ephemeral(ctx, format!("{} has no recorded infractions.", user.tag())).await;
    }

    let embed = CreateEmbed::new()
        .title(format!("Infractions for {}", user.tag()))
        .colour(Colour::BLURPLE)
        .description(format_infractions(&records))
        .footer(serenity::CreateEmbedFooter::new(format!("{} total", records.len())));
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
