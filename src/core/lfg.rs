//! LFG service - The single entry point the bot layer talks to.
//!
//! Owns the wizard, the squad manager and the provisioner, and sequences them for each
//! user action: confirm a draft, join, leave, close. Constructed once at startup and
//! shared through the bot's data, so tests can build a fresh one per case.

use crate::{
    core::{
        draft::LfgParams,
        guild_config::{self, GuildConfigInput},
        provisioner::{BestEffort, ChatPlatform, ResourceProvisioner},
        rotation::RotationTable,
        squad::{CloseOutcome, JoinOutcome, LeaveOutcome, SquadManager},
        store,
        wizard::{Selection, WizardController, WizardView},
    },
    entities::{Choice, LfgStatus, guild_config as guild_config_entity, lfg_request},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, warn};

/// What `/lfg create` should show.
#[derive(Clone, Debug, PartialEq)]
pub enum CreateStart {
    /// The wizard, starting from any existing draft
    Wizard(WizardView),
    /// The user already has an active request; offer to close it
    ExistingActive(lfg_request::Model),
}

/// Result of an action plus any best-effort failures to tell the user about.
#[derive(Clone, Debug, PartialEq)]
pub struct WithNotices<T> {
    /// The action's result
    pub value: T,
    /// Non-fatal provisioning notices
    pub notices: Vec<String>,
}

/// Application service wiring the LFG components together.
#[derive(Debug)]
pub struct LfgService {
    wizard: WizardController,
    squads: SquadManager,
    provisioner: ResourceProvisioner,
}

impl LfgService {
    /// Builds the service over a database, a rotation table and a chat platform.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        rotation: RotationTable,
        platform: Arc<dyn ChatPlatform>,
    ) -> Self {
        Self {
            wizard: WizardController::new(rotation),
            squads: SquadManager::new(db),
            provisioner: ResourceProvisioner::new(platform),
        }
    }

    /// Wizard controller
    #[must_use]
    pub const fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    /// Squad manager
    #[must_use]
    pub const fn squads(&self) -> &SquadManager {
        &self.squads
    }

    fn db(&self) -> &DatabaseConnection {
        self.squads.db()
    }

    async fn require_config(&self, guild_id: &str) -> Result<guild_config_entity::Model> {
        guild_config::get_guild_config(self.db(), guild_id)
            .await?
            .ok_or_else(|| Error::GuildNotConfigured {
                guild_id: guild_id.to_string(),
            })
    }

    async fn ping_role(&self, guild_id: &str) -> Option<String> {
        match guild_config::get_guild_config(self.db(), guild_id).await {
            Ok(config) => config.and_then(|config| config.ping_role_id),
            Err(e) => {
                warn!("Could not load ping role for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    /// Starts `/lfg create`: refuses unconfigured guilds and users who already have an
    /// active request.
    pub async fn begin_create(
        &self,
        guild_id: &str,
        user_id: &str,
        hour: u8,
    ) -> Result<CreateStart> {
        self.require_config(guild_id).await?;
        if let Some(existing) = self.squads.active_request_for_owner(guild_id, user_id).await? {
            return Ok(CreateStart::ExistingActive(existing));
        }
        Ok(CreateStart::Wizard(self.wizard.start(user_id, hour).await))
    }

    /// Applies a wizard selection.
    pub async fn select(
        &self,
        user_id: &str,
        selection: Selection,
        hour: u8,
    ) -> Result<WizardView> {
        self.wizard.select(user_id, selection, hour).await
    }

    /// Abandons the wizard.
    pub async fn cancel(&self, user_id: &str) -> bool {
        self.wizard.cancel(user_id).await
    }

    /// Commits the user's draft as a new request and provisions its resources.
    ///
    /// The draft survives any failure up to and including the insert, so the user can
    /// retry without re-selecting. Provisioning problems come back as notices.
    pub async fn confirm(
        &self,
        guild_id: &str,
        user_id: &str,
        user_tag: &str,
        hour: u8,
    ) -> Result<WithNotices<lfg_request::Model>> {
        let params: LfgParams = self.wizard.completed_params(user_id, hour).await?;
        let config = self.require_config(guild_id).await?;

        match self.provisioner.platform().verify_guild_config(&config).await {
            BestEffort::Done(()) => {}
            BestEffort::NotFound => {
                return Err(Error::GuildConfigInvalid {
                    guild_id: guild_id.to_string(),
                    reason: "a configured channel or role no longer exists".to_string(),
                });
            }
            BestEffort::Denied(reason) | BestEffort::Failed(reason) => {
                return Err(Error::GuildConfigInvalid {
                    guild_id: guild_id.to_string(),
                    reason,
                });
            }
        }

        let (request, guard) = self
            .squads
            .create_locked_request(guild_id, user_id, user_tag, params)
            .await?;
        self.wizard.finish(user_id).await;

        let report = self
            .provisioner
            .provision_created(&self.squads, &guard, request, &config)
            .await;

        Ok(WithNotices {
            value: report.request,
            notices: report.notices,
        })
    }

    /// Adds `user_id` to a squad and refreshes the announcement.
    pub async fn join(
        &self,
        request_id: &str,
        user_id: &str,
        user_tag: &str,
    ) -> Result<WithNotices<JoinOutcome>> {
        let guard = self.squads.lock_request(request_id).await;
        let outcome = self.squads.join_squad(&guard, user_id, user_tag).await?;
        let mut notices = Vec::new();

        if outcome.changed() {
            let request = outcome.request();
            let ping_role = self.ping_role(&request.guild_id).await;
            notices.extend(
                self.provisioner
                    .sync_announcement(&self.squads, &guard, ping_role.as_deref())
                    .await
                    .failure_notice("update the announcement"),
            );
            self.provisioner
                .notify_owner(
                    request,
                    &format!(
                        "🎮 **{user_tag}** joined your squad for {} ({}). Squad: {}/{}",
                        request.map.label(),
                        request.difficulty.label(),
                        request.members.len(),
                        request.squad_size
                    ),
                )
                .await;
        }

        Ok(WithNotices {
            value: outcome,
            notices,
        })
    }

    /// Removes a non-owner member from a squad and refreshes the announcement.
    pub async fn leave(
        &self,
        request_id: &str,
        user_id: &str,
        user_tag: &str,
    ) -> Result<WithNotices<LeaveOutcome>> {
        let guard = self.squads.lock_request(request_id).await;
        let outcome = self.squads.leave_squad(&guard, user_id).await?;
        let mut notices = Vec::new();

        if outcome.changed() {
            let request = outcome.request();
            let ping_role = self.ping_role(&request.guild_id).await;
            notices.extend(
                self.provisioner
                    .sync_announcement(&self.squads, &guard, ping_role.as_deref())
                    .await
                    .failure_notice("update the announcement"),
            );
            self.provisioner
                .notify_owner(
                    request,
                    &format!(
                        "👋 **{user_tag}** left your squad for {} ({}). Squad: {}/{}",
                        request.map.label(),
                        request.difficulty.label(),
                        request.members.len(),
                        request.squad_size
                    ),
                )
                .await;
        }

        Ok(WithNotices {
            value: outcome,
            notices,
        })
    }

    /// Closes a request on behalf of `actor_id`, who must own it, and tears down its
    /// resources. Closing an already closed request changes nothing.
    pub async fn close(
        &self,
        request_id: &str,
        actor_id: &str,
    ) -> Result<WithNotices<CloseOutcome>> {
        let guard = self.squads.lock_request(request_id).await;
        let request = self.squads.get(request_id).await?;
        if request.owner_id != actor_id {
            return Err(Error::NotOwner {
                request_id: request_id.to_string(),
                user_id: actor_id.to_string(),
            });
        }

        let outcome = self.squads.close(&guard).await?;
        let notices = if outcome.changed() {
            let ping_role = self.ping_role(&request.guild_id).await;
            self.provisioner
                .teardown(outcome.request(), ping_role.as_deref())
                .await
        } else {
            info!("LFG {} was already closed", request_id);
            Vec::new()
        };

        Ok(WithNotices {
            value: outcome,
            notices,
        })
    }

    /// The user's active request in a guild, if any.
    pub async fn active_request_for_owner(
        &self,
        guild_id: &str,
        owner_id: &str,
    ) -> Result<Option<lfg_request::Model>> {
        self.squads.active_request_for_owner(guild_id, owner_id).await
    }

    /// Every active request in a guild, oldest first.
    pub async fn active_requests(&self, guild_id: &str) -> Result<Vec<lfg_request::Model>> {
        store::get_requests_by_status(self.db(), guild_id, LfgStatus::Active).await
    }

    /// Saves a guild's LFG configuration.
    pub async fn configure_guild(
        &self,
        input: GuildConfigInput,
    ) -> Result<guild_config_entity::Model> {
        guild_config::save_guild_config(self.db(), input).await
    }
}
