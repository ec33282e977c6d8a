//! Selection drafts - In-progress wizard answers, keyed by user.
//!
//! A user has at most one draft. Two wizard flows opened by the same user share it,
//! so the latest selection wins. Drafts are dropped on cancel, on a successful
//! confirm, or by the idle sweep.

use crate::entities::{ClassTag, Difficulty, GameMap, LoadoutType, ObjectiveType, RankedStatus};
use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Wizard answers collected so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionDraft {
    /// Step 1: map
    pub map: Option<GameMap>,
    /// Step 1: difficulty
    pub difficulty: Option<Difficulty>,
    /// Step 1: ranked status
    pub ranked_status: Option<RankedStatus>,
    /// Step 2: objective tag
    pub objective_type: Option<ObjectiveType>,
    /// Step 2: loadout tag
    pub loadout_type: Option<LoadoutType>,
    /// Step 2: optional needed classes, deduplicated, at most two
    pub needed_classes: Vec<ClassTag>,
}

impl SelectionDraft {
    /// Whether map, difficulty and ranked status are all set.
    #[must_use]
    pub const fn step1_complete(&self) -> bool {
        self.map.is_some() && self.difficulty.is_some() && self.ranked_status.is_some()
    }

    /// Whether every required field is set.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.step1_complete() && self.objective_type.is_some() && self.loadout_type.is_some()
    }

    /// Labels of the required fields still unset, in wizard order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.map.is_none() {
            missing.push("Map");
        }
        if self.difficulty.is_none() {
            missing.push("Difficulty");
        }
        if self.ranked_status.is_none() {
            missing.push("Ranked Status");
        }
        if self.objective_type.is_none() {
            missing.push("Objective Type");
        }
        if self.loadout_type.is_none() {
            missing.push("Loadout Type");
        }
        missing
    }

    /// Converts a complete draft into request parameters.
    pub fn to_params(&self) -> Result<LfgParams> {
        match (
            self.map,
            self.difficulty,
            self.ranked_status,
            self.objective_type,
            self.loadout_type,
        ) {
            (
                Some(map),
                Some(difficulty),
                Some(ranked_status),
                Some(objective_type),
                Some(loadout_type),
            ) => {
                Ok(LfgParams {
                    map,
                    difficulty,
                    ranked_status,
                    objective_type,
                    loadout_type,
                    needed_classes: self.needed_classes.clone(),
                })
            }
            _ => Err(Error::IncompleteSelection {
                missing: self.missing_fields(),
            }),
        }
    }
}

/// Everything needed to create an LFG request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LfgParams {
    /// Map
    pub map: GameMap,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Ranked status
    pub ranked_status: RankedStatus,
    /// Objective tag
    pub objective_type: ObjectiveType,
    /// Loadout tag
    pub loadout_type: LoadoutType,
    /// Needed classes
    pub needed_classes: Vec<ClassTag>,
}

#[derive(Debug)]
struct DraftEntry {
    draft: SelectionDraft,
    touched_at: DateTime<Utc>,
}

/// Per-user draft map shared by every interaction handler.
#[derive(Debug, Default)]
pub struct DraftStore {
    drafts: RwLock<HashMap<String, DraftEntry>>,
}

impl DraftStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's draft.
    pub async fn get(&self, user_id: &str) -> Option<SelectionDraft> {
        self.drafts
            .read()
            .await
            .get(user_id)
            .map(|entry| entry.draft.clone())
    }

    /// Applies `change` to the user's draft, creating it if needed.
    ///
    /// The change runs against a copy; when it returns an error the stored draft is left
    /// untouched. Returns the draft as stored afterwards.
    pub async fn update<F>(&self, user_id: &str, change: F) -> Result<SelectionDraft>
    where
        F: FnOnce(&mut SelectionDraft) -> Result<()>,
    {
        let mut drafts = self.drafts.write().await;
        let mut draft = drafts
            .get(user_id)
            .map(|entry| entry.draft.clone())
            .unwrap_or_default();
        change(&mut draft)?;
        drafts.insert(
            user_id.to_string(),
            DraftEntry {
                draft: draft.clone(),
                touched_at: Utc::now(),
            },
        );
        Ok(draft)
    }

    /// Drops the user's draft, returning it if one existed.
    pub async fn remove(&self, user_id: &str) -> Option<SelectionDraft> {
        self.drafts
            .write()
            .await
            .remove(user_id)
            .map(|entry| entry.draft)
    }

    /// Drops drafts untouched for longer than `max_idle`. Returns how many were dropped.
    pub async fn sweep_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let mut drafts = self.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, entry| now.signed_duration_since(entry.touched_at) <= max_idle);
        let swept = before - drafts.len();
        if swept > 0 {
            debug!("Swept {} idle selection drafts", swept);
        }
        swept
    }

    /// Number of live drafts
    pub async fn len(&self) -> usize {
        self.drafts.read().await.len()
    }

    /// Whether no drafts are held
    pub async fn is_empty(&self) -> bool {
        self.drafts.read().await.is_empty()
    }
}
