//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**LfgBuddy Help**\n\
        Find teammates for Operations runs.\n\n\
        **LFG Commands**\n\
        • `/lfg create` - Pick a map, difficulty and playstyle, then post a squad request.\n\
        • `/lfg close` - Close your active request and remove its voice channel.\n\
        • `/lfg list` - Show the active requests in this server.\n\n\
        Use the **Join Squad** / **Leave Squad** buttons on an announcement to hop in or out.\n\
        Only maps currently in rotation can be picked.\n\n\
        **Admin Commands**\n\
        • `/setup_lfg <announcement_channel> <voice_category> [ping_role]` - Configure LFG for this server.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
