use crate::automod::{AutomodSettings, AutomodViolation};
use crate::commands::settings::{LEAVE_CHANNEL_KEY, STARBOARD_CHANNEL_KEY, WELCOME_CHANNEL_KEY};
use crate::limits::truncate;
use crate::modlog::{event_embed, send_log};
use crate::store::LogType;
use crate::{Data, EVENT_TARGET};
use poise::serenity_prelude::{
    self as serenity, ChannelId, Colour, Context, CreateMessage, EventHandler, GuildId, Member,
    Mentionable, Message, MessageId, MessageUpdateEvent, Reaction, ReactionType, Ready, RoleId,
    User, UserId,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long automod notices stay in the channel
const NOTICE_LIFETIME: Duration = Duration::from_secs(5);

/// Longest before or after excerpt in an edit log entry
const EDIT_EXCERPT_LIMIT: usize = 1800;

/// A guild message as automod sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screened {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub content: String,
}

impl Screened {
    /// None outside guilds and for bot authors
    #[must_use]
    pub fn from_parts(
        guild_id: Option<GuildId>,
        channel_id: ChannelId,
        message_id: MessageId,
        author: &User,
        content: &str,
    ) -> Option<Self> {
        if author.bot {
            return None;
        }
        Some(Self {
            guild_id: guild_id?,
            channel_id,
            message_id,
            author_id: author.id,
            content: content.to_string(),
        })
    }

    #[must_use]
    pub fn from_message(message: &Message) -> Option<Self> {
        Self::from_parts(
            message.guild_id,
            message.channel_id,
            message.id,
            &message.author,
            &message.content,
        )
    }

    /// The edited message, from the cache when it holds a copy and from the
    /// gateway event otherwise
    ///
    /// Returns None when the event carries no new content, as for embed-only
    /// updates of uncached messages.
    #[must_use]
    pub fn from_edit(cached: Option<&Message>, event: &MessageUpdateEvent) -> Option<Self> {
        if let Some(message) = cached {
            return Self::from_message(message);
        }
        Self::from_parts(
            event.guild_id,
            event.channel_id,
            event.id,
            event.author.as_ref()?,
            event.content.as_deref()?,
        )
    }
}

/// Description for the edit log entry
#[must_use]
pub fn edit_description(screened: &Screened, before: &str) -> String {
    format!(
        "{} edited a message in {}\n**Before:** {}\n**After:** {}",
        screened.author_id.mention(),
        screened.channel_id.mention(),
        truncate(before, EDIT_EXCERPT_LIMIT),
        truncate(&screened.content, EDIT_EXCERPT_LIMIT)
    )
}

#[must_use]
pub fn welcome_text(mention: &str) -> String {
    format!("Welcome to the server, {mention}!")
}

#[must_use]
pub fn leave_text(tag: &str) -> String {
    format!("{tag} has left the server.")
}

/// Key under which a reaction's emoji is bound to a role
#[must_use]
pub fn emoji_key(emoji: &ReactionType) -> String {
    emoji.to_string()
}

pub struct Handler {
    data: Data,
}

impl Handler {
    #[must_use]
    pub const fn new(data: Data) -> Self {
        Self { data }
    }

    /// A channel id stored in the guild document, if set
    async fn configured_channel(&self, guild_id: GuildId, key: &str) -> Option<ChannelId> {
        match self.data.db.get_config(guild_id.get()).await {
            Ok(config) => config.get_u64(key).filter(|id| *id != 0).map(ChannelId::new),
            Err(e) => {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), key, error = %e, "Failed to read guild config");
                None
            }
        }
    }

    /// Role bound to a reaction, skipping the bot's own reactions
    async fn bound_role(&self, ctx: &Context, reaction: &Reaction) -> Option<(GuildId, serenity::UserId, RoleId)> {
        let guild_id = reaction.guild_id?;
        let user_id = reaction.user_id?;
        if user_id == ctx.cache.current_user().id {
            return None;
        }
        let emoji = emoji_key(&reaction.emoji);
        match self
            .data
            .db
            .lookup_reaction_role(guild_id.get(), reaction.message_id.get(), &emoji)
            .await
        {
            Ok(role) => role.filter(|id| *id != 0).map(|id| (guild_id, user_id, RoleId::new(id))),
            Err(e) => {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to look up reaction role");
                None
            }
        }
    }

    async fn update_starboard(&self, ctx: &Context, reaction: &Reaction) {
        let Some(guild_id) = reaction.guild_id else {
            return;
        };
        let emoji = emoji_key(&reaction.emoji);
        if !self.data.starboard.counts(&emoji) {
            return;
        }
        if reaction.member.as_ref().is_some_and(|member| member.user.bot) {
            return;
        }
        let Some(starboard) = self.configured_channel(guild_id, STARBOARD_CHANNEL_KEY).await else {
            return;
        };

        let message = match reaction.message(&ctx.http).await {
            Ok(message) => message,
            Err(e) => {
                warn!(target: EVENT_TARGET, message_id = reaction.message_id.get(), error = %e, "Failed to fetch starred message");
                return;
            }
        };
        let count = message
            .reactions
            .iter()
            .find(|r| r.reaction_type == reaction.emoji)
            .map_or(0, |r| r.count);

        if !self.data.starboard.claim(&emoji, count, message.id.get()) {
            return;
        }

        let embed = self.data.starboard.embed(&message, count);
        match starboard
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await
        {
            Ok(_) => info!(
                target: EVENT_TARGET,
                guild_id = guild_id.get(),
                message_id = message.id.get(),
                count,
                "Message posted to starboard"
            ),
            Err(e) => {
                self.data.starboard.release(message.id.get());
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to post to starboard");
            }
        }
    }

    /// Run automod over a guild message. Returns true if the message was removed.
    async fn moderate(&self, ctx: &Context, message: &Screened) -> bool {
        let guild_id = message.guild_id;
        let settings = match self.data.db.get_config(guild_id.get()).await {
            Ok(config) => AutomodSettings::from_config(&config),
            Err(e) => {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to read automod settings");
                return false;
            }
        };
        if !settings.any_enabled() {
            return false;
        }
        let Some(violation) = self.data.automod.check(&settings, &message.content) else {
            return false;
        };

        if let Err(e) = message
            .channel_id
            .delete_message(&ctx.http, message.message_id)
            .await
        {
            warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to delete message flagged by automod");
            return false;
        }
        info!(
            target: EVENT_TARGET,
            guild_id = guild_id.get(),
            user_id = message.author_id.get(),
            violation = ?violation,
            "Automod removed a message"
        );
        self.post_notice(ctx, message, violation).await;
        true
    }

    async fn post_notice(&self, ctx: &Context, message: &Screened, violation: AutomodViolation) {
        let text = format!("{}, {}", message.author_id.mention(), violation.notice());
        match message.channel_id.say(&ctx.http, text).await {
            Ok(notice) => {
                let http = ctx.http.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(NOTICE_LIFETIME).await;
                    if let Err(e) = notice.delete(&*http).await {
                        debug!(target: EVENT_TARGET, error = %e, "Failed to remove automod notice");
                    }
                });
            }
            Err(e) => warn!(target: EVENT_TARGET, error = %e, "Failed to send automod notice"),
        }
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let user_name = ready.user.name.clone();
        let shard_id = ctx.shard_id;
        let guild_count = ready.guilds.len();
        info!(target: EVENT_TARGET, "Connected as {user_name}, shard {shard_id}, {guild_count} guild(s)");
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let guild_id = new_member.guild_id;
        if let Some(channel) = self.configured_channel(guild_id, WELCOME_CHANNEL_KEY).await {
            let text = welcome_text(&new_member.mention().to_string());
            if let Err(e) = channel.say(&ctx.http, text).await {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to send welcome message");
            }
        }
        send_log(
            &ctx.http,
            &self.data.db,
            guild_id.get(),
            LogType::Joins,
            event_embed(
                "Member Joined",
                Colour::DARK_GREEN,
                &format!("{} ({})", new_member.mention(), new_member.user.tag()),
            ),
        )
        .await;
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        if let Some(channel) = self.configured_channel(guild_id, LEAVE_CHANNEL_KEY).await {
            if let Err(e) = channel.say(&ctx.http, leave_text(&user.tag())).await {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to send leave message");
            }
        }
        send_log(
            &ctx.http,
            &self.data.db,
            guild_id.get(),
            LogType::Leaves,
            event_embed(
                "Member Left",
                Colour::DARK_RED,
                &format!("{} ({})", user.mention(), user.tag()),
            ),
        )
        .await;
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        if let Some((guild_id, user_id, role_id)) = self.bound_role(&ctx, &add_reaction).await {
            match ctx
                .http
                .add_member_role(guild_id, user_id, role_id, Some("Reaction role"))
                .await
            {
                Ok(()) => debug!(target: EVENT_TARGET, guild_id = guild_id.get(), user_id = user_id.get(), role_id = role_id.get(), "Reaction role granted"),
                Err(e) => warn!(target: EVENT_TARGET, guild_id = guild_id.get(), role_id = role_id.get(), error = %e, "Failed to grant reaction role"),
            }
        }
        self.update_starboard(&ctx, &add_reaction).await;
    }

    async fn reaction_remove(&self, ctx: Context, removed_reaction: Reaction) {
        if let Some((guild_id, user_id, role_id)) = self.bound_role(&ctx, &removed_reaction).await {
            match ctx
                .http
                .remove_member_role(guild_id, user_id, role_id, Some("Reaction role"))
                .await
            {
                Ok(()) => debug!(target: EVENT_TARGET, guild_id = guild_id.get(), user_id = user_id.get(), role_id = role_id.get(), "Reaction role revoked"),
                Err(e) => warn!(target: EVENT_TARGET, guild_id = guild_id.get(), role_id = role_id.get(), error = %e, "Failed to revoke reaction role"),
            }
        }
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        let Some(screened) = Screened::from_message(&new_message) else {
            return;
        };
        let guild_id = screened.guild_id;
        if self.moderate(&ctx, &screened).await {
            return;
        }

        let response = match self
            .data
            .db
            .custom_command(guild_id.get(), &new_message.content)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to look up custom command");
                None
            }
        };
        if let Some(response) = response {
            if let Err(e) = new_message.channel_id.say(&ctx.http, response).await {
                warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to send custom command response");
            }
        }
    }

    async fn message_update(
        &self,
        ctx: Context,
        old_if_available: Option<Message>,
        new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        let Some(edited) = Screened::from_edit(new.as_ref(), &event) else {
            return;
        };
        if self.moderate(&ctx, &edited).await {
            return;
        }
        let Some(old) = old_if_available else {
            return;
        };
        if old.content == edited.content {
            return;
        }
        send_log(
            &ctx.http,
            &self.data.db,
            edited.guild_id.get(),
            LogType::MessageEdit,
            event_embed("Message Edited", Colour::GOLD, &edit_description(&edited, &old.content)),
        )
        .await;
    }

    async fn message_delete(
        &self,
        ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        let Some(guild_id) = guild_id else {
            return;
        };
        if let Err(e) = self
            .data
            .db
            .unbind_message(guild_id.get(), deleted_message_id.get())
            .await
        {
            warn!(target: EVENT_TARGET, guild_id = guild_id.get(), error = %e, "Failed to remove reaction roles for deleted message");
        }
        send_log(
            &ctx.http,
            &self.data.db,
            guild_id.get(),
            LogType::MessageDelete,
            event_embed(
                "Message Deleted",
                Colour::RED,
                &format!("Message {} deleted in {}", deleted_message_id.get(), channel_id.mention()),
            ),
        )
        .await;
    }
}
