//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `LfgBuddy` application,
//! including all slash commands, component interaction handlers, the Discord
//! implementation of the chat platform, and bot startup.

/// Discord command implementations (lfg, setup, general)
pub mod commands;
/// Discord interaction handlers (buttons, select menus)
pub mod handlers;
/// `ChatPlatform` implementation over serenity's HTTP client
pub mod platform;
/// Serenity builders for core views
pub mod views;

use crate::{
    config::settings::Settings,
    core::{lfg::LfgService, rotation::RotationTable},
    errors::{Error, Result},
};
use platform::SerenityPlatform;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// How often idle drafts are looked for, at most.
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Shared data available to all bot commands.
/// This structure holds the database connection and the LFG service that every
/// command and interaction handler goes through.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// LFG workflow shared by commands and component handlers
    pub lfg: Arc<LfgService>,
}

impl BotData {
    /// Creates a new `BotData` instance around an already wired LFG service.
    #[must_use]
    pub const fn new(database: DatabaseConnection, lfg: Arc<LfgService>) -> Self {
        Self { database, lfg }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_precondition() {
                warn!("Command `{}` refused: {}", ctx.command().name, error);
            } else {
                error!("Error in command `{}`: {:?}", ctx.command().name, error);
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        handlers::components::handle_component(ctx, component, data).await;
    }
    Ok(())
}

/// Periodically drops wizard drafts nobody has touched for `ttl_minutes`.
fn spawn_draft_sweeper(lfg: Arc<LfgService>, ttl_minutes: u64) {
    let Ok(ttl_minutes) = i64::try_from(ttl_minutes) else {
        warn!("Draft TTL of {} minutes is too large, not sweeping", ttl_minutes);
        return;
    };
    let ttl = chrono::Duration::minutes(ttl_minutes);
    let period = std::time::Duration::from_secs(SWEEP_INTERVAL_SECS);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let swept = lfg
                .wizard()
                .drafts()
                .sweep_idle(ttl, chrono::Utc::now())
                .await;
            if swept > 0 {
                info!("Expired {} idle LFG drafts", swept);
            }
        }
    });
}

fn dev_guild() -> Option<serenity::GuildId> {
    let raw = std::env::var("DEV_GUILD_ID").ok()?;
    match platform::snowflake(&raw) {
        Some(id) => Some(serenity::GuildId::new(id)),
        None => {
            warn!("Ignoring invalid DEV_GUILD_ID {:?}", raw);
            None
        }
    }
}

/// Builds the poise framework and runs the bot until the gateway connection ends.
#[instrument(skip(token, database, settings))]
pub async fn run_bot(
    token: String,
    database: DatabaseConnection,
    settings: Settings,
) -> Result<()> {
    let rotation: RotationTable = settings.rotation_table();
    let draft_ttl_minutes = settings.lfg.draft_ttl_minutes;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::lfg(),
                commands::setup_lfg(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);

                if let Some(guild_id) = dev_guild() {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {}", guild_id);
                } else {
                    info!("Registering commands globally...");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                let platform = Arc::new(SerenityPlatform::new(Arc::clone(&ctx.http)));
                let lfg = Arc::new(LfgService::new(database.clone(), rotation, platform));

                if draft_ttl_minutes > 0 {
                    spawn_draft_sweeper(Arc::clone(&lfg), draft_ttl_minutes);
                } else {
                    debug!("Draft sweeping disabled");
                }

                Ok(BotData::new(database, lfg))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_VOICE_STATES;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {}", e))?;
    Ok(())
}
