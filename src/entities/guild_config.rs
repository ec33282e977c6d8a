//! Guild configuration entity - Where a guild's LFG announcements and voice channels go.
//!
//! At most one row per guild; it must exist before any LFG request can be created there.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild configuration database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guild_configs")]
pub struct Model {
    /// Discord guild ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: String,
    /// Text channel that receives announcements
    pub announcement_channel_id: String,
    /// Category under which voice channels are created
    pub voice_category_id: String,
    /// Role mentioned in announcements; `@everyone` when absent
    pub ping_role_id: Option<String>,
    /// When the configuration was first saved
    pub created_at: DateTimeUtc,
    /// When the configuration was last saved
    pub updated_at: DateTimeUtc,
}

/// Guild configurations have no foreign-key relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
