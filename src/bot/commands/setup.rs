//! Server setup command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::guild_config::GuildConfigInput,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    /// Configures where LFG announcements and squad voice channels go.
    ///
    /// Running it again replaces the previous configuration.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        default_member_permissions = "ADMINISTRATOR"
    )]
    pub async fn setup_lfg(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Channel where LFG announcements are posted"]
        #[channel_types("Text", "News")]
        announcement_channel: serenity::GuildChannel,
        #[description = "Category that squad voice channels are created in"]
        #[channel_types("Category")]
        voice_category: serenity::GuildChannel,
        #[description = "Role to ping for new requests (defaults to @everyone)"]
        ping_role: Option<serenity::Role>,
    ) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?;

        let saved = ctx
            .data()
            .lfg
            .configure_guild(GuildConfigInput {
                guild_id: guild_id.to_string(),
                announcement_channel_id: announcement_channel.id.to_string(),
                voice_category_id: voice_category.id.to_string(),
                ping_role_id: ping_role.as_ref().map(|role| role.id.to_string()),
            })
            .await?;
        info!("{} configured LFG for guild {}", ctx.author().tag(), guild_id);

        let ping = saved
            .ping_role_id
            .as_deref()
            .map_or_else(|| "@everyone".to_string(), |id| format!("<@&{id}>"));
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "✅ LFG is set up!\n\
                     • Announcements: <#{}>\n\
                     • Voice channels: **{}**\n\
                     • Ping: {ping}",
                    saved.announcement_channel_id, voice_category.name
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

pub use inner::*;
