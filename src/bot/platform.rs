//! [`ChatPlatform`] over the Discord HTTP API.

use crate::{
    bot::views,
    core::{
        announcement::AnnouncementView,
        provisioner::{BestEffort, ChatPlatform, VoiceChannelSpec},
    },
    entities::guild_config,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::{
    ChannelId, ChannelType, CreateChannel, CreateMessage, GuildId, Http, MessageId,
    PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use std::sync::Arc;
use tracing::debug;

/// Discord JSON error code for "target user is not connected to voice".
const NOT_IN_VOICE: isize = 40032;

/// Talks to Discord through serenity's HTTP client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl std::fmt::Debug for SerenityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityPlatform").finish_non_exhaustive()
    }
}

impl SerenityPlatform {
    /// Wraps the HTTP client of a running bot.
    #[must_use]
    pub const fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// Maps an HTTP status and Discord message onto a [`BestEffort`] failure.
pub(crate) fn classify_status<T>(status: u16, code: isize, message: String) -> BestEffort<T> {
    match status {
        404 => BestEffort::NotFound,
        403 => BestEffort::Denied(message),
        _ if code == NOT_IN_VOICE => BestEffort::NotFound,
        _ => BestEffort::Failed(message),
    }
}

fn classify<T>(result: std::result::Result<T, serenity::Error>) -> BestEffort<T> {
    match result {
        Ok(value) => BestEffort::Done(value),
        Err(serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))) => {
            classify_status(
                response.status_code.as_u16(),
                response.error.code,
                response.error.message,
            )
        }
        Err(e) => BestEffort::Failed(e.to_string()),
    }
}

/// Parses a stored snowflake. Zero is not a valid id.
pub(crate) fn snowflake(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|id| *id != 0)
}

macro_rules! id_or_fail {
    ($kind:ident, $raw:expr) => {
        match snowflake($raw) {
            Some(id) => $kind::new(id),
            None => return BestEffort::Failed(format!("invalid id {:?}", $raw)),
        }
    };
}

impl SerenityPlatform {
    async fn guild_channel(&self, raw: &str) -> BestEffort<serenity::GuildChannel> {
        let channel_id = id_or_fail!(ChannelId, raw);
        match classify(channel_id.to_channel(&*self.http).await) {
            BestEffort::Done(channel) => channel
                .guild()
                .map_or(BestEffort::NotFound, BestEffort::Done),
            BestEffort::NotFound => BestEffort::NotFound,
            BestEffort::Denied(reason) => BestEffort::Denied(reason),
            BestEffort::Failed(reason) => BestEffort::Failed(reason),
        }
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn verify_guild_config(&self, config: &guild_config::Model) -> BestEffort<()> {
        let guild_id = id_or_fail!(GuildId, &config.guild_id);

        let announcement = match self.guild_channel(&config.announcement_channel_id).await {
            BestEffort::Done(channel) => channel,
            other => return other.map(|_| ()),
        };
        if announcement.guild_id != guild_id
            || !matches!(announcement.kind, ChannelType::Text | ChannelType::News)
        {
            return BestEffort::Failed("the announcement channel is not a text channel".to_string());
        }

        let category = match self.guild_channel(&config.voice_category_id).await {
            BestEffort::Done(channel) => channel,
            other => return other.map(|_| ()),
        };
        if category.guild_id != guild_id || category.kind != ChannelType::Category {
            return BestEffort::Failed("the voice category is not a category".to_string());
        }

        if let Some(raw_role) = config.ping_role_id.as_deref() {
            let role_id = id_or_fail!(RoleId, raw_role);
            match classify(guild_id.roles(&*self.http).await) {
                BestEffort::Done(roles) if roles.contains_key(&role_id) => {}
                BestEffort::Done(_) => return BestEffort::NotFound,
                other => return other.map(|_| ()),
            }
        }

        BestEffort::Done(())
    }

    async fn create_voice_channel(&self, spec: &VoiceChannelSpec) -> BestEffort<String> {
        let guild_id = id_or_fail!(GuildId, &spec.guild_id);
        let category_id = id_or_fail!(ChannelId, &spec.category_id);
        let owner_id = id_or_fail!(UserId, &spec.owner_id);

        let permissions = vec![
            // The @everyone role shares the guild's id
            PermissionOverwrite {
                allow: Permissions::VIEW_CHANNEL | Permissions::CONNECT | Permissions::SPEAK,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
            },
            PermissionOverwrite {
                allow: Permissions::MOVE_MEMBERS
                    | Permissions::MUTE_MEMBERS
                    | Permissions::DEAFEN_MEMBERS
                    | Permissions::MANAGE_CHANNELS,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(owner_id),
            },
        ];

        let builder = CreateChannel::new(&spec.name)
            .kind(ChannelType::Voice)
            .category(category_id)
            .permissions(permissions)
            .audit_log_reason(&spec.reason);

        classify(guild_id.create_channel(&*self.http, builder).await)
            .map(|channel| channel.id.to_string())
    }

    async fn delete_channel(&self, channel_id: &str) -> BestEffort<()> {
        let channel_id = id_or_fail!(ChannelId, channel_id);
        classify(channel_id.delete(&*self.http).await).map(|_| ())
    }

    async fn send_announcement(
        &self,
        channel_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<String> {
        let channel_id = id_or_fail!(ChannelId, channel_id);
        classify(
            channel_id
                .send_message(&*self.http, views::create_announcement(view))
                .await,
        )
        .map(|message| message.id.to_string())
    }

    async fn edit_announcement(
        &self,
        channel_id: &str,
        message_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<()> {
        let channel_id = id_or_fail!(ChannelId, channel_id);
        let message_id = id_or_fail!(MessageId, message_id);
        classify(
            channel_id
                .edit_message(&*self.http, message_id, views::edit_announcement(view))
                .await,
        )
        .map(|_| ())
    }

    async fn move_to_voice(
        &self,
        guild_id: &str,
        user_id: &str,
        channel_id: &str,
    ) -> BestEffort<()> {
        let guild_id = id_or_fail!(GuildId, guild_id);
        let user_id = id_or_fail!(UserId, user_id);
        let channel_id = id_or_fail!(ChannelId, channel_id);
        classify(guild_id.move_member(&*self.http, user_id, channel_id).await).map(|_| ())
    }

    async fn notify_user(&self, user_id: &str, message: &str) -> BestEffort<()> {
        let user_id = id_or_fail!(UserId, user_id);
        let dm = match classify(user_id.create_dm_channel(&*self.http).await) {
            BestEffort::Done(dm) => dm,
            other => return other.map(|_| ()),
        };
        let sent = classify(
            dm.send_message(&*self.http, CreateMessage::new().content(message))
                .await,
        );
        if !sent.is_done() {
            debug!("DM to {} was not delivered: {:?}", user_id, sent);
        }
        sent.map(|_| ())
    }
}
