//! Button and select menu interactions.
//!
//! Each interaction is parsed into an [`LfgComponent`] once, then dispatched. Errors are
//! answered privately with [`Error::user_message`]; answering an interaction that was
//! already acknowledged is a harmless race and only logged.

use crate::{
    bot::{BotData, handlers::custom_id::LfgComponent, views},
    core::{
        rotation::current_hour_utc,
        squad::{CloseOutcome, JoinOutcome, LeaveOutcome},
        wizard::Selection,
    },
    entities::{Choice, lfg_request},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use serenity::{
    ComponentInteraction, ComponentInteractionDataKind, CreateActionRow,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse,
};
use std::fmt::Write;
use tracing::{debug, error, info, warn};

/// "Interaction has already been acknowledged"
const ALREADY_ACKNOWLEDGED: isize = 40060;
/// "Unknown interaction", usually an expired token
const UNKNOWN_INTERACTION: isize = 10062;

pub(crate) const fn is_benign_code(code: isize) -> bool {
    matches!(code, ALREADY_ACKNOWLEDGED | UNKNOWN_INTERACTION)
}

fn is_benign(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if is_benign_code(response.error.code)
    )
}

/// Handles a component interaction. Ids this bot did not issue are ignored.
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
) {
    let Some(component) = LfgComponent::parse(&interaction.data.custom_id) else {
        debug!("Ignoring component {}", interaction.data.custom_id);
        return;
    };

    if let Err(e) = dispatch(ctx, interaction, data, component).await {
        if e.is_precondition() {
            warn!(
                "Component {} by {} refused: {}",
                interaction.data.custom_id, interaction.user.id, e
            );
        } else {
            error!(
                "Component {} by {} failed: {}",
                interaction.data.custom_id, interaction.user.id, e
            );
        }
        report_error(ctx, interaction, &e).await;
    }
}

async fn dispatch(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
    component: LfgComponent,
) -> Result<()> {
    let user_id = interaction.user.id.to_string();
    let hour = current_hour_utc();

    match component {
        LfgComponent::Select(field) => {
            let selection = Selection::parse(field, selected_values(interaction))?;
            let view = data.lfg.select(&user_id, selection, hour).await?;
            update_message(ctx, interaction, &view.content, views::wizard_components(&view)).await
        }
        LfgComponent::CreateConfirm => confirm_create(ctx, interaction, data, hour).await,
        LfgComponent::CreateCancel | LfgComponent::CancelCreation => {
            data.lfg.cancel(&user_id).await;
            update_message(ctx, interaction, "❌ LFG creation cancelled.", Vec::new()).await
        }
        LfgComponent::Join(request_id) => join(ctx, interaction, data, &request_id).await,
        LfgComponent::Leave(request_id) => leave(ctx, interaction, data, &request_id).await,
        LfgComponent::CloseConfirm(request_id) => {
            close(ctx, interaction, data, &request_id, false).await
        }
        LfgComponent::CloseExisting(request_id) => {
            close(ctx, interaction, data, &request_id, true).await
        }
        LfgComponent::CloseCancel => {
            update_message(
                ctx,
                interaction,
                "Close cancelled. Your LFG request is still open.",
                Vec::new(),
            )
            .await
        }
    }
}

fn selected_values(interaction: &ComponentInteraction) -> &[String] {
    match &interaction.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values,
        _ => &[],
    }
}

async fn confirm_create(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
    hour: u8,
) -> Result<()> {
    let guild_id = interaction.guild_id.ok_or(Error::GuildOnly)?.to_string();
    let user_id = interaction.user.id.to_string();

    // Provisioning can outlast the initial response window
    respond(ctx, interaction, CreateInteractionResponse::Acknowledge).await?;

    let created = data
        .lfg
        .confirm(&guild_id, &user_id, &interaction.user.tag(), hour)
        .await?;
    let request = &created.value;
    info!("{} created LFG {} in guild {}", interaction.user.tag(), request.id, guild_id);

    let mut content = format!(
        "✅ Your LFG request for **{} ({})** has been posted!",
        request.map.label(),
        request.difficulty.label()
    );
    if let Some(voice) = &request.voice_channel_id {
        write!(content, "\n🎤 Voice channel: <#{voice}>")?;
    }
    append_notices(&mut content, &created.notices)?;

    interaction
        .edit_response(
            ctx,
            EditInteractionResponse::new()
                .content(content)
                .components(Vec::new()),
        )
        .await?;
    Ok(())
}

async fn join(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
    request_id: &str,
) -> Result<()> {
    let user_id = interaction.user.id.to_string();
    let joined = data
        .lfg
        .join(request_id, &user_id, &interaction.user.tag())
        .await?;

    let mut content = match &joined.value {
        JoinOutcome::Joined(request) => joined_message(request),
        JoinOutcome::AlreadyMember(_) => "You are already in this squad.".to_string(),
    };
    append_notices(&mut content, &joined.notices)?;
    reply_ephemeral(ctx, interaction, content, Vec::new()).await
}

fn joined_message(request: &lfg_request::Model) -> String {
    let mut message = format!(
        "✅ You joined the squad for **{} ({})**!",
        request.map.label(),
        request.difficulty.label()
    );
    if let Some(voice) = &request.voice_channel_id {
        message.push_str(&format!(" Hop into <#{voice}>."));
    }
    message
}

async fn leave(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
    request_id: &str,
) -> Result<()> {
    let user_id = interaction.user.id.to_string();
    match data
        .lfg
        .leave(request_id, &user_id, &interaction.user.tag())
        .await
    {
        Ok(left) => {
            let mut content = match left.value {
                LeaveOutcome::Left(_) => "👋 You left the squad.".to_string(),
                LeaveOutcome::NotMember(_) => "You are not in this squad.".to_string(),
            };
            append_notices(&mut content, &left.notices)?;
            reply_ephemeral(ctx, interaction, content, Vec::new()).await
        }
        // The owner gets the close prompt instead
        Err(Error::OwnerCannotLeave { request_id }) => {
            reply_ephemeral(
                ctx,
                interaction,
                "You're the owner of this squad and can't leave it. Do you want to close the LFG request instead?".to_string(),
                views::close_prompt_components(&request_id),
            )
            .await
        }
        Err(e) => Err(e),
    }
}

async fn close(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &BotData,
    request_id: &str,
    from_create: bool,
) -> Result<()> {
    let user_id = interaction.user.id.to_string();
    respond(ctx, interaction, CreateInteractionResponse::Acknowledge).await?;

    let closed = data.lfg.close(request_id, &user_id).await?;
    let mut content = match closed.value {
        CloseOutcome::Closed(_) => {
            info!("{} closed LFG {}", interaction.user.tag(), request_id);
            "✅ Your LFG request has been closed. The announcement was updated and the voice channel removed.".to_string()
        }
        CloseOutcome::AlreadyClosed(_) => "This LFG request was already closed.".to_string(),
    };
    if from_create {
        content.push_str("\nYou can now run `/lfg create` again.");
    }
    append_notices(&mut content, &closed.notices)?;

    interaction
        .edit_response(
            ctx,
            EditInteractionResponse::new()
                .content(content)
                .components(Vec::new()),
        )
        .await?;
    Ok(())
}

fn append_notices(content: &mut String, notices: &[String]) -> Result<()> {
    for notice in notices {
        write!(content, "\n{notice}")?;
    }
    Ok(())
}

async fn respond(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    response: CreateInteractionResponse,
) -> Result<()> {
    match interaction.create_response(ctx, response).await {
        Ok(()) => Ok(()),
        Err(e) if is_benign(&e) => {
            debug!("Interaction {} already acknowledged: {}", interaction.id, e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn update_message(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    content: &str,
    components: Vec<CreateActionRow>,
) -> Result<()> {
    respond(
        ctx,
        interaction,
        CreateInteractionResponse::UpdateMessage(
            CreateInteractionResponseMessage::new()
                .content(content)
                .components(components),
        ),
    )
    .await
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    content: String,
    components: Vec<CreateActionRow>,
) -> Result<()> {
    respond(
        ctx,
        interaction,
        CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .components(components)
                .ephemeral(true),
        ),
    )
    .await
}

/// Sends the user-facing text of `e`, as a reply if the interaction is still open and
/// as a follow-up once it has been acknowledged.
async fn report_error(ctx: &serenity::Context, interaction: &ComponentInteraction, e: &Error) {
    let message = e.user_message();
    let reply = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(message.clone())
            .ephemeral(true),
    );

    match interaction.create_response(ctx, reply).await {
        Ok(()) => {}
        Err(err) if is_benign(&err) => {
            let followup = CreateInteractionResponseFollowup::new()
                .content(message)
                .ephemeral(true);
            if let Err(err) = interaction.create_followup(ctx, followup).await {
                error!("Failed to send error follow-up for {}: {}", interaction.id, err);
            }
        }
        Err(err) => error!("Failed to send error reply for {}: {}", interaction.id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_request;

    #[test]
    fn test_benign_codes() {
        assert!(is_benign_code(40060));
        assert!(is_benign_code(10062));
        assert!(!is_benign_code(50013));
        assert!(!is_benign_code(10008));
    }

    #[test]
    fn test_joined_message_mentions_voice() {
        let mut request = sample_request("r1", "g1", "owner");
        assert_eq!(
            joined_message(&request),
            "✅ You joined the squad for **Zero Dam (Easy)**!"
        );

        request.voice_channel_id = Some("42".to_string());
        assert!(joined_message(&request).ends_with("Hop into <#42>."));
    }

    #[test]
    fn test_append_notices() -> Result<()> {
        let mut content = "done".to_string();
        append_notices(&mut content, &["⚠️ one".to_string(), "⚠️ two".to_string()])?;
        assert_eq!(content, "done\n⚠️ one\n⚠️ two");
        Ok(())
    }
}
