//! LFG Discord commands - `/lfg create`, `/lfg close` and `/lfg list`.
//!
//! All replies are ephemeral. The wizard itself continues through component
//! interactions handled in [`crate::bot::handlers::components`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, views},
        core::{lfg::CreateStart, rotation::current_hour_utc},
        entities::Choice,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Looking-for-group requests.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("lfg_create", "lfg_close", "lfg_list"),
        subcommand_required
    )]
    pub async fn lfg(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Starts the LFG wizard.
    ///
    /// If the caller already has an active request they are offered to close it instead.
    #[poise::command(slash_command, guild_only, rename = "create")]
    pub async fn lfg_create(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?.to_string();
        let user_id = ctx.author().id.to_string();

        let reply = match ctx
            .data()
            .lfg
            .begin_create(&guild_id, &user_id, current_hour_utc())
            .await?
        {
            CreateStart::Wizard(view) => poise::CreateReply::default()
                .content(view.content.clone())
                .components(views::wizard_components(&view)),
            CreateStart::ExistingActive(existing) => poise::CreateReply::default()
                .content(format!(
                    "You already have an active LFG request for **{} ({})**. Close it to start a new one?",
                    existing.map.label(),
                    existing.difficulty.label()
                ))
                .components(views::existing_request_components(&existing.id)),
        };

        ctx.send(reply.ephemeral(true)).await?;
        Ok(())
    }

    /// Closes your active LFG request after confirmation.
    #[poise::command(slash_command, guild_only, rename = "close")]
    pub async fn lfg_close(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?.to_string();
        let user_id = ctx.author().id.to_string();

        let reply = match ctx
            .data()
            .lfg
            .active_request_for_owner(&guild_id, &user_id)
            .await?
        {
            Some(request) => poise::CreateReply::default()
                .content(format!(
                    "Close your LFG request for **{} ({})**? The voice channel will be deleted.",
                    request.map.label(),
                    request.difficulty.label()
                ))
                .components(views::close_prompt_components(&request.id)),
            None => poise::CreateReply::default().content("You don't have an active LFG request."),
        };

        ctx.send(reply.ephemeral(true)).await?;
        Ok(())
    }

    /// Lists the active LFG requests in this server.
    #[poise::command(slash_command, guild_only, rename = "list")]
    pub async fn lfg_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = ctx.guild_id().ok_or(Error::GuildOnly)?.to_string();
        let requests = ctx.data().lfg.active_requests(&guild_id).await?;

        if requests.is_empty() {
            ctx.send(
                poise::CreateReply::default()
                    .content("📭 No active LFG requests right now. Start one with `/lfg create`!")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }

        let lines: Vec<String> = requests.iter().map(views::request_summary).collect();
        let embed = serenity::CreateEmbed::default()
            .title(format!("**Active LFG Requests ({})**", requests.len()))
            .color(0x0000_FF00)
            .description(views::request_list_description(&lines));

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }
}

pub use inner::*;
