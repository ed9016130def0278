//! Slash commands

pub mod channels;
pub mod moderation;
pub mod reaction_roles;
pub mod settings;
pub mod utility;

use crate::{Context, Data, Error};
use poise::serenity_prelude::GuildId;

/// Every command the bot registers
#[must_use]
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping(),
        moderation::kick(),
        moderation::ban(),
        moderation::unban(),
        moderation::mute(),
        moderation::unmute(),
        moderation::warn(),
        moderation::infractions(),
        settings::log(),
        settings::set_welcome(),
        settings::set_leave(),
        settings::set_starboard(),
        settings::automod(),
        reaction_roles::rr_add(),
        reaction_roles::rr_remove(),
        utility::remindme(),
        utility::reminders(),
        utility::custom_add(),
        utility::custom_remove(),
        utility::custom_list(),
        channels::slowmode(),
        channels::lock(),
        channels::unlock(),
    ]
}

/// The guild a guild-only command runs in
pub(crate) fn require_guild(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| "This command can only be used in a server".into())
}

/// Reply visible only to the invoking user
pub(crate) async fn reply_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_command_names_unique() {
        let commands = all();
        let names = commands
            .iter()
            .map(|cmd| cmd.name.clone())
            .collect::<HashSet<_>>();
        assert_eq!(names.len(), commands.len());
    }

    #[test]
    fn test_all_commands_register_as_slash() {
        for cmd in all() {
            assert!(
                cmd.create_as_slash_command().is_some(),
                "{} is not a slash command",
                cmd.name
            );
            assert!(cmd.description.is_some(), "{} has no description", cmd.name);
        }
    }

    #[test]
    fn test_all_commands_guild_only() {
        for cmd in all() {
            assert!(cmd.guild_only, "{} is usable in DMs", cmd.name);
        }
    }
}
