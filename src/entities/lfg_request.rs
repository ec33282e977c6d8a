//! LFG request entity - A squad-finding post owned by one user.
//!
//! Each request carries the wizard selections, the squad roster (owner first), its
//! `active`/`closed` status and references to the voice channel and announcement
//! message provisioned for it. Requests are closed, never physically deleted.

use super::options::{
    ClassTag, Difficulty, GameMap, LfgStatus, LoadoutType, ObjectiveType, RankedStatus,
};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One squad member entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadMember {
    /// Discord user ID
    pub id: String,
    /// Discord user tag at join time
    pub tag: String,
    /// When the member joined
    pub joined_at: DateTimeUtc,
}

/// Ordered squad roster, stored as a JSON document. The owner is always first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SquadMembers(pub Vec<SquadMember>);

impl SquadMembers {
    /// Whether the given user is on the roster
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.0.iter().any(|member| member.id == user_id)
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the roster is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Classes the owner asked for, stored as a JSON document (at most two)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct NeededClasses(pub Vec<ClassTag>);

/// LFG request database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lfg_requests")]
pub struct Model {
    /// Unique request ID, generated at creation and never changed
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Guild the request belongs to
    pub guild_id: String,
    /// Discord user ID of the owner
    pub owner_id: String,
    /// Discord user tag of the owner
    pub owner_tag: String,
    /// When the request was created
    pub created_at: DateTimeUtc,
    /// When the request was last written
    pub updated_at: DateTimeUtc,
    /// When the request was closed, if it has been
    pub closed_at: Option<DateTimeUtc>,
    /// Fixed game mode label
    pub mode: String,
    /// Squad capacity including the owner
    pub squad_size: i32,
    /// Selected map
    pub map: GameMap,
    /// Selected difficulty
    pub difficulty: Difficulty,
    /// Selected ranked status
    pub ranked_status: RankedStatus,
    /// Selected objective tag
    pub objective_type: ObjectiveType,
    /// Selected loadout tag
    pub loadout_type: LoadoutType,
    /// Needed class tags
    #[sea_orm(column_type = "Json")]
    pub needed_classes: NeededClasses,
    /// `active` or `closed`
    pub status: LfgStatus,
    /// Current roster, owner first
    #[sea_orm(column_type = "Json")]
    pub members: SquadMembers,
    /// Voice channel provisioned for the squad
    pub voice_channel_id: Option<String>,
    /// Channel holding the announcement message
    pub announcement_channel_id: Option<String>,
    /// Announcement message ID
    pub announcement_message_id: Option<String>,
}

impl Model {
    /// Whether the request still accepts membership changes
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LfgStatus::Active
    }

    /// Open slots left in the squad (zero when full)
    #[must_use]
    pub fn open_slots(&self) -> usize {
        usize::try_from(self.squad_size)
            .unwrap_or(0)
            .saturating_sub(self.members.len())
    }

    /// Whether the squad has reached capacity
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.open_slots() == 0
    }
}

/// LFG requests have no foreign-key relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
