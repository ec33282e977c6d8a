//! Option sets offered by the LFG wizard and stored on each request.
//!
//! The single-valued options are `SeaORM` active enums stored as their display label,
//! so the database, the select menus and `config.toml` all use the same strings.
//! Class tags live inside a JSON column and only need serde.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A closed set of labelled choices presented in a select menu.
pub trait Choice: Copy + PartialEq + Sized + 'static {
    /// Every choice, in menu order.
    const ALL: &'static [Self];

    /// Label shown to users; also the stored and submitted value.
    fn label(self) -> &'static str;

    /// Parses a submitted menu value back into a choice.
    fn from_label(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|choice| choice.label() == value)
    }
}

/// Playable map
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum GameMap {
    /// Zero Dam
    #[sea_orm(string_value = "Zero Dam")]
    #[serde(rename = "Zero Dam")]
    ZeroDam,
    /// Layali Grove
    #[sea_orm(string_value = "Layali Grove")]
    #[serde(rename = "Layali Grove")]
    LayaliGrove,
    /// Space City
    #[sea_orm(string_value = "Space City")]
    #[serde(rename = "Space City")]
    SpaceCity,
    /// Brakkesh
    #[sea_orm(string_value = "Brakkesh")]
    #[serde(rename = "Brakkesh")]
    Brakkesh,
}

impl Choice for GameMap {
    const ALL: &'static [Self] = &[
        Self::ZeroDam,
        Self::LayaliGrove,
        Self::SpaceCity,
        Self::Brakkesh,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::ZeroDam => "Zero Dam",
            Self::LayaliGrove => "Layali Grove",
            Self::SpaceCity => "Space City",
            Self::Brakkesh => "Brakkesh",
        }
    }
}

/// Map difficulty
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Difficulty {
    /// Easy
    #[sea_orm(string_value = "Easy")]
    Easy,
    /// Normal
    #[sea_orm(string_value = "Normal")]
    Normal,
}

impl Choice for Difficulty {
    const ALL: &'static [Self] = &[Self::Easy, Self::Normal];

    fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
        }
    }
}

/// Whether the squad plays ranked
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum RankedStatus {
    /// Ranked
    #[sea_orm(string_value = "Ranked")]
    Ranked,
    /// Not Ranked
    #[sea_orm(string_value = "Not Ranked")]
    #[serde(rename = "Not Ranked")]
    NotRanked,
}

impl Choice for RankedStatus {
    const ALL: &'static [Self] = &[Self::Ranked, Self::NotRanked];

    fn label(self) -> &'static str {
        match self {
            Self::Ranked => "Ranked",
            Self::NotRanked => "Not Ranked",
        }
    }
}

/// Squad objective tag
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ObjectiveType {
    /// Hotspots
    #[sea_orm(string_value = "Hotspots")]
    Hotspots,
    /// Scavenge
    #[sea_orm(string_value = "Scavenge")]
    Scavenge,
}

impl Choice for ObjectiveType {
    const ALL: &'static [Self] = &[Self::Hotspots, Self::Scavenge];

    fn label(self) -> &'static str {
        match self {
            Self::Hotspots => "Hotspots",
            Self::Scavenge => "Scavenge",
        }
    }
}

/// Squad loadout tag
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum LoadoutType {
    /// Fully Armed
    #[sea_orm(string_value = "Fully Armed")]
    #[serde(rename = "Fully Armed")]
    FullyArmed,
    /// Scavenger Hunt
    #[sea_orm(string_value = "Scavenger Hunt")]
    #[serde(rename = "Scavenger Hunt")]
    ScavengerHunt,
    /// Risk it for the Biscuit
    #[sea_orm(string_value = "Risk it for the Biscuit")]
    #[serde(rename = "Risk it for the Biscuit")]
    RiskItForTheBiscuit,
}

impl Choice for LoadoutType {
    const ALL: &'static [Self] = &[
        Self::FullyArmed,
        Self::ScavengerHunt,
        Self::RiskItForTheBiscuit,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::FullyArmed => "Fully Armed",
            Self::ScavengerHunt => "Scavenger Hunt",
            Self::RiskItForTheBiscuit => "Risk it for the Biscuit",
        }
    }
}

/// Class the squad is looking for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassTag {
    /// Need Recon
    #[serde(rename = "Need Recon")]
    Recon,
    /// Need Assault
    #[serde(rename = "Need Assault")]
    Assault,
    /// Need Engineer
    #[serde(rename = "Need Engineer")]
    Engineer,
    /// Need Support
    #[serde(rename = "Need Support")]
    Support,
}

impl Choice for ClassTag {
    const ALL: &'static [Self] = &[Self::Recon, Self::Assault, Self::Engineer, Self::Support];

    fn label(self) -> &'static str {
        match self {
            Self::Recon => "Need Recon",
            Self::Assault => "Need Assault",
            Self::Engineer => "Need Engineer",
            Self::Support => "Need Support",
        }
    }
}

/// Lifecycle status of an LFG request
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum LfgStatus {
    /// Accepting joins and leaves
    #[sea_orm(string_value = "active")]
    Active,
    /// Terminal; no further membership changes
    #[sea_orm(string_value = "closed")]
    Closed,
}
