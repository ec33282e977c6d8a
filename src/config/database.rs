//! Database configuration module for `LfgBuddy`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent, which lets the
//! bot call it on every start.

use crate::entities::{GuildConfig, LfgRequest, LfgRequestColumn};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/lfg_buddy.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory a file-backed `SQLite` URL points into, if any.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set. The
/// database file's directory is created when missing.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&url) {
        std::fs::create_dir_all(dir)?;
    }
    Database::connect(&url).await.map_err(Into::into)
}

/// Creates all tables (if missing) plus the owner lookup index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut lfg_request_table = schema.create_table_from_entity(LfgRequest);
    lfg_request_table.if_not_exists();
    let mut guild_config_table = schema.create_table_from_entity(GuildConfig);
    guild_config_table.if_not_exists();

    db.execute(builder.build(&lfg_request_table)).await?;
    db.execute(builder.build(&guild_config_table)).await?;

    // Serves the (guild, owner, status) lookup done on every create
    let owner_index = Index::create()
        .if_not_exists()
        .name("idx_lfg_requests_guild_owner_status")
        .table(LfgRequest)
        .col(LfgRequestColumn::GuildId)
        .col(LfgRequestColumn::OwnerId)
        .col(LfgRequestColumn::Status)
        .to_owned();
    db.execute(builder.build(&owner_index)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{GuildConfigModel, LfgRequestModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<LfgRequestModel> = LfgRequest::find().limit(1).all(&db).await?;
        let _: Vec<GuildConfigModel> = GuildConfig::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/lfg_buddy.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://lfg.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
    }

    #[test]
    fn test_default_database_url() {
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(get_database_url(), DEFAULT_DATABASE_URL);
        }
    }
}
