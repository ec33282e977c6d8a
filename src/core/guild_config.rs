//! Guild configuration - Where each guild wants announcements and voice channels.

use crate::{
    entities::{GuildConfig, guild_config},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Values an administrator supplies through `/setup_lfg`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildConfigInput {
    /// Guild being configured
    pub guild_id: String,
    /// Text channel for announcements
    pub announcement_channel_id: String,
    /// Category for squad voice channels
    pub voice_category_id: String,
    /// Optional role to ping
    pub ping_role_id: Option<String>,
}

/// Retrieves the configuration for a guild, if one was saved.
pub async fn get_guild_config(
    db: &DatabaseConnection,
    guild_id: &str,
) -> Result<Option<guild_config::Model>> {
    GuildConfig::find_by_id(guild_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Saves a guild's configuration, replacing any previous one.
pub async fn save_guild_config(
    db: &DatabaseConnection,
    input: GuildConfigInput,
) -> Result<guild_config::Model> {
    if input.announcement_channel_id.is_empty() || input.voice_category_id.is_empty() {
        return Err(Error::Config {
            message: "Announcement channel and voice category are required".to_string(),
        });
    }

    let now = Utc::now();
    let existing = get_guild_config(db, &input.guild_id).await?;
    let saved = if let Some(existing) = existing {
        let mut active: guild_config::ActiveModel = existing.into();
        active.announcement_channel_id = Set(input.announcement_channel_id);
        active.voice_category_id = Set(input.voice_category_id);
        active.ping_role_id = Set(input.ping_role_id);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        guild_config::ActiveModel {
            guild_id: Set(input.guild_id),
            announcement_channel_id: Set(input.announcement_channel_id),
            voice_category_id: Set(input.voice_category_id),
            ping_role_id: Set(input.ping_role_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };

    info!("Saved LFG configuration for guild {}", saved.guild_id);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(guild: &str, channel: &str, role: Option<&str>) -> GuildConfigInput {
        GuildConfigInput {
            guild_id: guild.to_string(),
            announcement_channel_id: channel.to_string(),
            voice_category_id: "category".to_string(),
            ping_role_id: role.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn test_get_missing_config() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_guild_config(&db, "g1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_then_overwrite() -> Result<()> {
        let db = setup_test_db().await?;
        let first = save_guild_config(&db, input("g1", "ann1", Some("role"))).await?;
        assert_eq!(first.ping_role_id.as_deref(), Some("role"));

        let second = save_guild_config(&db, input("g1", "ann2", None)).await?;
        assert_eq!(second.announcement_channel_id, "ann2");
        assert_eq!(second.ping_role_id, None);
        assert_eq!(second.created_at, first.created_at);

        let loaded = get_guild_config(&db, "g1").await?.unwrap();
        assert_eq!(loaded, second);
        assert_eq!(GuildConfig::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_requires_channels() -> Result<()> {
        let db = setup_test_db().await?;
        let result = save_guild_config(&db, input("g1", "", None)).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }
}
