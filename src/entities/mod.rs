//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and the option enums stored in them.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod guild_config;
pub mod lfg_request;
pub mod options;

// Re-export specific types to avoid conflicts
pub use guild_config::{
    Column as GuildConfigColumn, Entity as GuildConfig, Model as GuildConfigModel,
};
pub use lfg_request::{
    Column as LfgRequestColumn, Entity as LfgRequest, Model as LfgRequestModel, NeededClasses,
    SquadMember, SquadMembers,
};
pub use options::{
    Choice, ClassTag, Difficulty, GameMap, LfgStatus, LoadoutType, ObjectiveType, RankedStatus,
};
