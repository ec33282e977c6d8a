//! Shared test utilities for `LfgBuddy`.
//!
//! This module provides common helpers for setting up test databases, building
//! fixture records with sensible defaults, and a scripted in-memory chat platform.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        announcement::AnnouncementView,
        draft::LfgParams,
        provisioner::{BestEffort, ChatPlatform, VoiceChannelSpec},
        squad::new_request,
    },
    entities::{
        Difficulty, GameMap, LoadoutType, ObjectiveType, RankedStatus, guild_config, lfg_request,
    },
    errors::Result,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Wizard answers for a Zero Dam (Easy), ranked, hotspots, fully armed squad with no
/// needed classes.
#[must_use]
pub fn sample_params() -> LfgParams {
    LfgParams {
        map: GameMap::ZeroDam,
        difficulty: Difficulty::Easy,
        ranked_status: RankedStatus::Ranked,
        objective_type: ObjectiveType::Hotspots,
        loadout_type: LoadoutType::FullyArmed,
        needed_classes: Vec::new(),
    }
}

/// An active request built from [`sample_params`], not yet stored.
///
/// # Defaults
/// * owner tag: `"{owner}#0001"`
/// * members: the owner only
/// * no voice channel or announcement
#[must_use]
pub fn sample_request(id: &str, guild_id: &str, owner_id: &str) -> lfg_request::Model {
    let mut request = new_request(
        guild_id,
        owner_id,
        &format!("{owner_id}#0001"),
        sample_params(),
        Utc::now(),
    );
    request.id = id.to_string();
    request
}

/// A guild configuration pointing at `announcements` and `voice`, without a ping role.
#[must_use]
pub fn sample_guild_config(guild_id: &str) -> guild_config::Model {
    let now = Utc::now();
    guild_config::Model {
        guild_id: guild_id.to_string(),
        announcement_channel_id: "announcements".to_string(),
        voice_category_id: "voice".to_string(),
        ping_role_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Scripted answer for one kind of platform call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FakeOutcome {
    /// Call succeeds
    Succeed,
    /// Target does not exist
    NotFound,
    /// Bot lacks permission
    Denied,
    /// Any other platform error
    Failed,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<String>,
    scripted: HashMap<&'static str, FakeOutcome>,
    next_id: u64,
    announcements: Vec<AnnouncementView>,
}

/// In-memory [`ChatPlatform`] that records every call.
///
/// Operation keys for [`FakePlatform::script`]: `verify`, `create_voice`,
/// `delete_channel`, `send_announcement`, `edit_announcement`, `move`, `notify`.
/// Unscripted operations succeed.
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    /// A platform where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `operation` call answer with `outcome`.
    pub fn script(&self, operation: &'static str, outcome: FakeOutcome) {
        self.state.lock().unwrap().scripted.insert(operation, outcome);
    }

    /// Calls recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The most recently sent or edited announcement.
    #[must_use]
    pub fn last_announcement(&self) -> Option<AnnouncementView> {
        self.state.lock().unwrap().announcements.last().cloned()
    }

    fn record<T>(
        &self,
        operation: &'static str,
        call: String,
        succeed: impl FnOnce(&mut FakeState) -> T,
    ) -> BestEffort<T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state
            .scripted
            .get(operation)
            .copied()
            .unwrap_or(FakeOutcome::Succeed)
        {
            FakeOutcome::Succeed => BestEffort::Done(succeed(&mut state)),
            FakeOutcome::NotFound => BestEffort::NotFound,
            FakeOutcome::Denied => BestEffort::Denied("Missing Permissions".to_string()),
            FakeOutcome::Failed => BestEffort::Failed("Internal Server Error".to_string()),
        }
    }
}

fn next_id(state: &mut FakeState, prefix: &str) -> String {
    state.next_id += 1;
    format!("{prefix}{}", state.next_id)
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn verify_guild_config(&self, config: &guild_config::Model) -> BestEffort<()> {
        self.record("verify", format!("verify:{}", config.guild_id), |_| ())
    }

    async fn create_voice_channel(&self, spec: &VoiceChannelSpec) -> BestEffort<String> {
        self.record("create_voice", format!("create_voice:{}", spec.name), |state| {
            next_id(state, "vc")
        })
    }

    async fn delete_channel(&self, channel_id: &str) -> BestEffort<()> {
        self.record("delete_channel", format!("delete_channel:{channel_id}"), |_| ())
    }

    async fn send_announcement(
        &self,
        channel_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<String> {
        self.record(
            "send_announcement",
            format!("send_announcement:{channel_id}"),
            |state| {
                state.announcements.push(view.clone());
                next_id(state, "msg")
            },
        )
    }

    async fn edit_announcement(
        &self,
        channel_id: &str,
        message_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<()> {
        self.record(
            "edit_announcement",
            format!("edit_announcement:{channel_id}:{message_id}"),
            |state| state.announcements.push(view.clone()),
        )
    }

    async fn move_to_voice(
        &self,
        _guild_id: &str,
        user_id: &str,
        channel_id: &str,
    ) -> BestEffort<()> {
        self.record("move", format!("move:{user_id}:{channel_id}"), |_| ())
    }

    async fn notify_user(&self, user_id: &str, _message: &str) -> BestEffort<()> {
        self.record("notify", format!("notify:{user_id}"), |_| ())
    }
}
