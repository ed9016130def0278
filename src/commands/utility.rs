use super::{reply_ephemeral, require_guild};
use crate::limits::{MESSAGE_LIMIT, join_within};
use crate::reminders::now_unix;
use crate::store::ScheduledTask;
use crate::{Context, Error};
use poise::command;

/// Longest reminder delay, in minutes (one year)
pub const MAX_REMINDER_MINUTES: i64 = 525_600;

/// Basic ping command
/// This command is used to check if the bot is responsive.
#[command(prefix_command, slash_command, guild_only)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// When a reminder set `minutes` from `now` falls due
#[must_use]
pub fn reminder_due(now: i64, minutes: i64) -> Option<i64> {
    if minutes <= 0 || minutes > MAX_REMINDER_MINUTES {
        return None;
    }
    now.checked_add(minutes * 60)
}

/// Render pending reminders as one message, soonest first
#[must_use]
pub fn format_pending(tasks: &[ScheduledTask]) -> String {
    let lines = tasks
        .iter()
        .map(|task| format!("<t:{}:R>: {}", task.due, task.payload))
        .collect::<Vec<_>>();
    join_within(&lines, tasks.len(), MESSAGE_LIMIT)
}

/// Get a direct message after some minutes
#[command(slash_command, guild_only)]
pub async fn remindme(
    ctx: Context<'_>,
    #[description = "Minutes from now"]
    #[min = 1]
    minutes: i64,
    #[description = "What to remind you of"]
    #[max_length = 1000]
    message: String,
) -> Result<(), Error> {
    let Some(due) = reminder_due(now_unix(), minutes) else {
        return reply_ephemeral(
            ctx,
            format!("Minutes must be between 1 and {MAX_REMINDER_MINUTES}."),
        )
        .await;
    };

    ctx.data()
        .db
        .schedule_reminder(ctx.author().id.get(), due, &message)
        .await?;
    reply_ephemeral(ctx, format!("⏰ Reminder set for {minutes} minutes.")).await
}

/// List your pending reminders
#[command(slash_command, guild_only)]
pub async fn reminders(ctx: Context<'_>) -> Result<(), Error> {
    let pending = ctx
        .data()
        .db
        .pending_reminders(ctx.author().id.get())
        .await?;
    if pending.is_empty() {
        return reply_ephemeral(ctx, "You have no pending reminders.").await;
    }
    reply_ephemeral(ctx, format_pending(&pending)).await
}

/// Add or replace a custom text command
#[command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn custom_add(
    ctx: Context<'_>,
    #[description = "Text that triggers the command"]
    #[max_length = 100]
    name: String,
    #[description = "Reply to send"]
    #[max_length = 2000]
    response: String,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if name.trim().is_empty() {
        return reply_ephemeral(ctx, "Command name cannot be empty.").await;
    }
    ctx.data()
        .db
        .set_custom_command(guild_id.get(), &name, &response)
        .await?;
    ctx.say(format!("Custom command `{}` added.", name.trim()))
        .await?;
    Ok(())
}

/// Delete a custom text command
#[command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn custom_remove(
    ctx: Context<'_>,
    #[description = "Command to delete"] name: String,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    if ctx
        .data()
        .db
        .remove_custom_command(guild_id.get(), &name)
        .await?
    {
        ctx.say(format!("Custom command `{}` removed.", name.trim()))
            .await?;
        Ok(())
    } else {
        reply_ephemeral(ctx, "No such custom command.").await
    }
}

/// List this server's custom text commands
#[command(slash_command, guild_only)]
pub async fn custom_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx)?;
    let names = ctx.data().db.custom_commands(guild_id.get()).await?;
    if names.is_empty() {
        return reply_ephemeral(ctx, "No custom commands defined.").await;
    }
    let lines = names
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>();
    reply_ephemeral(ctx, join_within(&lines, names.len(), MESSAGE_LIMIT)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_command_definition() {
        let cmd = ping();
        assert_eq!(cmd.name, "ping");
        assert!(
            cmd.description
                .unwrap_or_default()
                .contains("check if the bot is responsive")
        );
        assert!(cmd.guild_only);
        assert!(cmd.prefix_action.is_some());
    }

    #[test]
    fn test_reminder_due() {
        assert_eq!(reminder_due(1_000, 1), Some(1_060));
        assert_eq!(reminder_due(1_000, 0), None);
        assert_eq!(reminder_due(1_000, -5), None);
        assert_eq!(reminder_due(1_000, MAX_REMINDER_MINUTES + 1), None);
        assert_eq!(reminder_due(i64::MAX - 10, 1), None);
    }

    #[test]
    fn test_custom_command_management_requires_manage_guild() {
        for cmd in [custom_add(), custom_remove()] {
            assert!(
                cmd.required_permissions
                    .contains(poise::serenity_prelude::Permissions::MANAGE_GUILD)
            );
        }
        assert!(custom_list().required_permissions.is_empty());
    }

    fn max_length_of(cmd: &poise::Command<crate::Data, Error>, name: &str) -> Option<u64> {
        let param = cmd.parameters.iter().find(|p| p.name == name)?;
        let option = param.create_as_slash_command_option()?;
        serde_json::to_value(option).ok()?["max_length"].as_u64()
    }

    #[test]
    fn test_text_parameters_are_bounded() {
        assert_eq!(
            max_length_of(&remindme(), "message"),
            Some(crate::limits::REMINDER_LIMIT as u64)
        );
        assert_eq!(max_length_of(&custom_add(), "name"), Some(100));
        assert_eq!(max_length_of(&custom_add(), "response"), Some(MESSAGE_LIMIT as u64));
    }

    #[test]
    fn test_pending_listing_fits_in_one_message() {
        let task = |id: i64, payload: String| ScheduledTask {
            id,
            owner_id: 1,
            due: 1_700_000_000 + id,
            payload,
        };

        let few = vec![task(1, "water plants".to_string()), task(2, "standup".to_string())];
        assert_eq!(
            format_pending(&few),
            "<t:1700000001:R>: water plants\n<t:1700000002:R>: standup"
        );

        let one_huge = vec![task(1, "x".repeat(2100))];
        assert!(format_pending(&one_huge).chars().count() <= MESSAGE_LIMIT);

        let many = (0..10).map(|id| task(id, "y".repeat(1000))).collect::<Vec<_>>();
        let listing = format_pending(&many);
        assert!(listing.chars().count() <= MESSAGE_LIMIT);
        assert!(listing.ends_with("more"));
    }
}
