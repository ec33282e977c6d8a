//! Map availability - Which map/difficulty pairs are playable at a given UTC hour.
//!
//! A pair is available when it is marked permanent or when the hour is one of its
//! rotation hours. Pairs missing from the table are never available. Every lookup
//! takes the hour as an argument so callers (and tests) decide what "now" means.

use crate::entities::{Choice, Difficulty, GameMap};
use chrono::{Timelike, Utc};
use serde::Deserialize;

/// One row of the rotation table
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RotationEntry {
    /// Map this row applies to
    pub map: GameMap,
    /// Difficulty this row applies to
    pub difficulty: Difficulty,
    /// Available at every hour
    #[serde(default)]
    pub permanent: bool,
    /// UTC hours (0-23) during which the pair is in rotation
    #[serde(default)]
    pub hours: Vec<u8>,
}

impl RotationEntry {
    fn permanent(map: GameMap, difficulty: Difficulty) -> Self {
        Self {
            map,
            difficulty,
            permanent: true,
            hours: Vec::new(),
        }
    }

    fn rotating(map: GameMap, difficulty: Difficulty, hours: &[u8]) -> Self {
        Self {
            map,
            difficulty,
            permanent: false,
            hours: hours.to_vec(),
        }
    }

    fn is_open_at(&self, hour: u8) -> bool {
        self.permanent || self.hours.contains(&hour)
    }
}

/// Static rotation table consulted by the wizard and at confirm time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotationTable {
    entries: Vec<RotationEntry>,
}

impl RotationTable {
    /// Builds a table from explicit entries.
    #[must_use]
    pub const fn new(entries: Vec<RotationEntry>) -> Self {
        Self { entries }
    }

    /// The default rotation shipped with the bot.
    #[must_use]
    pub fn builtin() -> Self {
        use Difficulty::{Easy, Normal};
        use GameMap::{Brakkesh, LayaliGrove, SpaceCity, ZeroDam};

        Self::new(vec![
            RotationEntry::permanent(ZeroDam, Easy),
            RotationEntry::permanent(ZeroDam, Normal),
            RotationEntry::permanent(LayaliGrove, Easy),
            RotationEntry::rotating(
                LayaliGrove,
                Normal,
                &[0, 1, 2, 6, 7, 8, 12, 13, 14, 18, 19, 20],
            ),
            RotationEntry::rotating(
                SpaceCity,
                Easy,
                &[3, 4, 5, 9, 10, 11, 15, 16, 17, 21, 22, 23],
            ),
            RotationEntry::rotating(SpaceCity, Normal, &[12, 13, 14, 15, 16, 17]),
            RotationEntry::rotating(Brakkesh, Easy, &[18, 19, 20, 21]),
            // Crosses midnight
            RotationEntry::rotating(Brakkesh, Normal, &[22, 23, 0, 1]),
        ])
    }

    /// Table rows
    #[must_use]
    pub fn entries(&self) -> &[RotationEntry] {
        &self.entries
    }

    /// Whether `map` at `difficulty` can be played at `hour` (UTC).
    #[must_use]
    pub fn is_available(&self, map: GameMap, difficulty: Difficulty, hour: u8) -> bool {
        self.entries.iter().any(|entry| {
            entry.map == map && entry.difficulty == difficulty && entry.is_open_at(hour)
        })
    }

    /// Maps playable at `hour`, optionally restricted to one difficulty. Menu order.
    #[must_use]
    pub fn available_maps(&self, difficulty: Option<Difficulty>, hour: u8) -> Vec<GameMap> {
        GameMap::ALL
            .iter()
            .copied()
            .filter(|map| match difficulty {
                Some(difficulty) => self.is_available(*map, difficulty, hour),
                None => Difficulty::ALL
                    .iter()
                    .any(|difficulty| self.is_available(*map, *difficulty, hour)),
            })
            .collect()
    }

    /// Difficulties playable at `hour`, optionally restricted to one map. Menu order.
    #[must_use]
    pub fn available_difficulties(&self, map: Option<GameMap>, hour: u8) -> Vec<Difficulty> {
        Difficulty::ALL
            .iter()
            .copied()
            .filter(|difficulty| match map {
                Some(map) => self.is_available(map, *difficulty, hour),
                None => GameMap::ALL
                    .iter()
                    .any(|map| self.is_available(*map, *difficulty, hour)),
            })
            .collect()
    }
}

impl Default for RotationTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Current hour of the day in UTC.
#[must_use]
pub fn current_hour_utc() -> u8 {
    u8::try_from(Utc::now().hour()).unwrap_or(0)
}
