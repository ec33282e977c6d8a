//! Resource provisioner - Mirrors request state onto the chat platform.
//!
//! On creation it makes a voice channel and posts the announcement; after membership
//! changes it re-renders the announcement; on close it retires the announcement and
//! deletes the voice channel. Every platform call is best effort: failures become
//! notices for the initiating user and never undo the stored state change.

use crate::{
    core::{
        announcement::{AnnouncementView, render_announcement, voice_channel_name},
        locks::RequestGuard,
        squad::SquadManager,
        store::ResourceRef,
    },
    entities::{guild_config, lfg_request},
    errors::Error,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of a platform call that is allowed to fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BestEffort<T> {
    /// The call succeeded
    Done(T),
    /// The target channel, message, role or user does not exist (anymore)
    NotFound,
    /// The bot lacks permission
    Denied(String),
    /// Any other failure
    Failed(String),
}

impl<T> BestEffort<T> {
    /// The success value, if any
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::NotFound | Self::Denied(_) | Self::Failed(_) => None,
        }
    }

    /// Maps the success value, keeping failures as they are
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        match self {
            Self::Done(value) => BestEffort::Done(f(value)),
            Self::NotFound => BestEffort::NotFound,
            Self::Denied(reason) => BestEffort::Denied(reason),
            Self::Failed(reason) => BestEffort::Failed(reason),
        }
    }

    /// Whether the call succeeded
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Notice shown to the user when `what` could not be done.
    pub fn failure_notice(&self, what: &str) -> Option<String> {
        match self {
            Self::Done(_) => None,
            Self::NotFound => Some(format!("⚠️ Could not {what}: it no longer exists.")),
            Self::Denied(_) => Some(format!(
                "⚠️ Could not {what}: the bot is missing permissions. Please contact a server admin."
            )),
            Self::Failed(_) => Some(format!("⚠️ Could not {what}. Please try again later.")),
        }
    }

    fn log_failure(&self, request_id: &str, what: &str) {
        match self {
            Self::Done(_) => {}
            Self::NotFound => warn!("LFG {}: could not {}: not found", request_id, what),
            Self::Denied(reason) => warn!("LFG {}: could not {}: {}", request_id, what, reason),
            Self::Failed(reason) => error!("LFG {}: could not {}: {}", request_id, what, reason),
        }
    }
}

/// Parameters for a squad voice channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceChannelSpec {
    /// Guild to create it in
    pub guild_id: String,
    /// Parent category
    pub category_id: String,
    /// Channel name
    pub name: String,
    /// Owner, granted moderation permissions in the channel
    pub owner_id: String,
    /// Audit log reason
    pub reason: String,
}

/// What the provisioner needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Checks that the configured channels and role exist and have the right kinds.
    async fn verify_guild_config(&self, config: &guild_config::Model) -> BestEffort<()>;

    /// Creates a voice channel, returning its ID.
    async fn create_voice_channel(&self, spec: &VoiceChannelSpec) -> BestEffort<String>;

    /// Deletes a channel.
    async fn delete_channel(&self, channel_id: &str) -> BestEffort<()>;

    /// Posts an announcement, returning the message ID.
    async fn send_announcement(
        &self,
        channel_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<String>;

    /// Replaces an announcement's content, embed and buttons.
    async fn edit_announcement(
        &self,
        channel_id: &str,
        message_id: &str,
        view: &AnnouncementView,
    ) -> BestEffort<()>;

    /// Moves a member into a voice channel (only works if they are in voice already).
    async fn move_to_voice(
        &self,
        guild_id: &str,
        user_id: &str,
        channel_id: &str,
    ) -> BestEffort<()>;

    /// Sends a direct message.
    async fn notify_user(&self, user_id: &str, message: &str) -> BestEffort<()>;
}

/// Result of provisioning a new request.
#[derive(Clone, Debug, PartialEq)]
pub struct ProvisionReport {
    /// The request with every resource reference that could be attached
    pub request: lfg_request::Model,
    /// Failures worth telling the owner about
    pub notices: Vec<String>,
}

/// Drives platform side effects for request state changes.
pub struct ResourceProvisioner {
    platform: Arc<dyn ChatPlatform>,
}

impl std::fmt::Debug for ResourceProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProvisioner").finish_non_exhaustive()
    }
}

impl ResourceProvisioner {
    /// Creates a provisioner over `platform`.
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Platform in use
    #[must_use]
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }

    /// Creates the voice channel and the announcement for a freshly created request.
    ///
    /// The announcement is attempted whether or not the voice channel worked, unless the
    /// request turns out to be closed already.
    pub async fn provision_created(
        &self,
        squads: &SquadManager,
        guard: &RequestGuard,
        mut request: lfg_request::Model,
        config: &guild_config::Model,
    ) -> ProvisionReport {
        let mut notices = Vec::new();

        let spec = VoiceChannelSpec {
            guild_id: request.guild_id.clone(),
            category_id: config.voice_category_id.clone(),
            name: voice_channel_name(&request),
            owner_id: request.owner_id.clone(),
            reason: format!("LFG created by {} (ID: {})", request.owner_tag, request.id),
        };
        let voice = self.platform.create_voice_channel(&spec).await;
        voice.log_failure(&request.id, "create the voice channel");
        notices.extend(voice.failure_notice("create a voice channel for your squad"));

        if let Some(channel_id) = voice.done() {
            info!("Created voice channel {} for LFG {}", channel_id, request.id);
            match squads
                .attach_resource(
                    guard,
                    ResourceRef::Voice {
                        channel_id: channel_id.clone(),
                    },
                )
                .await
            {
                Ok(updated) => {
                    request = updated;
                    let moved = self
                        .platform
                        .move_to_voice(&request.guild_id, &request.owner_id, &channel_id)
                        .await;
                    if !moved.is_done() {
                        debug!("Did not move owner of LFG {} into voice: {:?}", request.id, moved);
                    }
                }
                Err(Error::RequestClosed { .. }) => {
                    warn!("LFG {} closed before its voice channel was linked", request.id);
                    self.discard_channel(&request.id, &channel_id).await;
                    return ProvisionReport { request, notices };
                }
                Err(e) => {
                    error!("Failed to record voice channel for LFG {}: {}", request.id, e);
                    self.discard_channel(&request.id, &channel_id).await;
                    notices.push(
                        "⚠️ The voice channel was created but could not be linked to your \
                         request, so it was removed."
                            .to_string(),
                    );
                }
            }
        }

        let view = render_announcement(&request, config.ping_role_id.as_deref());
        let sent = self
            .platform
            .send_announcement(&config.announcement_channel_id, &view)
            .await;
        sent.log_failure(&request.id, "send the announcement");
        notices.extend(sent.failure_notice("post the announcement"));

        if let Some(message_id) = sent.done() {
            match squads
                .attach_resource(
                    guard,
                    ResourceRef::Announcement {
                        channel_id: config.announcement_channel_id.clone(),
                        message_id,
                    },
                )
                .await
            {
                Ok(updated) => request = updated,
                Err(e) => {
                    error!("Failed to record announcement for LFG {}: {}", request.id, e);
                    notices.push(
                        "⚠️ The announcement was posted but could not be linked to your request."
                            .to_string(),
                    );
                }
            }
        }

        ProvisionReport { request, notices }
    }

    /// Re-renders the announcement from the latest stored record.
    ///
    /// Holding the guard means no other mutation of this request can land between the
    /// read and the edit.
    pub async fn sync_announcement(
        &self,
        squads: &SquadManager,
        guard: &RequestGuard,
        ping_role_id: Option<&str>,
    ) -> BestEffort<()> {
        let request = match squads.get(guard.request_id()).await {
            Ok(request) => request,
            Err(e) => {
                error!(
                    "Failed to reload LFG {} for announcement sync: {}",
                    guard.request_id(),
                    e
                );
                return BestEffort::Failed(e.to_string());
            }
        };
        let (Some(channel_id), Some(message_id)) = (
            request.announcement_channel_id.as_deref(),
            request.announcement_message_id.as_deref(),
        ) else {
            debug!("LFG {} has no announcement to update", request.id);
            return BestEffort::Done(());
        };

        let view = render_announcement(&request, ping_role_id);
        let edited = self
            .platform
            .edit_announcement(channel_id, message_id, &view)
            .await;
        edited.log_failure(&request.id, "update the announcement");
        edited
    }

    /// Retires the announcement and deletes the voice channel of a closed request.
    ///
    /// Resources already deleted elsewhere count as done. Returns notices for the
    /// remaining failures.
    pub async fn teardown(
        &self,
        request: &lfg_request::Model,
        ping_role_id: Option<&str>,
    ) -> Vec<String> {
        let mut notices = Vec::new();

        if let (Some(channel_id), Some(message_id)) = (
            request.announcement_channel_id.as_deref(),
            request.announcement_message_id.as_deref(),
        ) {
            let view = render_announcement(request, ping_role_id);
            match self
                .platform
                .edit_announcement(channel_id, message_id, &view)
                .await
            {
                BestEffort::NotFound => {
                    warn!("Announcement for LFG {} was already deleted", request.id);
                }
                other => {
                    other.log_failure(&request.id, "mark the announcement closed");
                    notices.extend(other.failure_notice("mark the announcement as closed"));
                }
            }
        }

        if let Some(channel_id) = request.voice_channel_id.as_deref() {
            match self.platform.delete_channel(channel_id).await {
                BestEffort::Done(()) => {
                    info!("Deleted voice channel {} for LFG {}", channel_id, request.id);
                }
                BestEffort::NotFound => {
                    warn!(
                        "Voice channel {} for LFG {} was already deleted",
                        channel_id, request.id
                    );
                }
                other => {
                    other.log_failure(&request.id, "delete the voice channel");
                    notices.extend(other.failure_notice("delete the voice channel"));
                }
            }
        }

        notices
    }

    /// Deletes a voice channel that no request refers to.
    async fn discard_channel(&self, request_id: &str, channel_id: &str) {
        let deleted = self.platform.delete_channel(channel_id).await;
        deleted.log_failure(request_id, "delete the unlinked voice channel");
    }

    /// Sends the owner a direct message; failures are only logged.
    pub async fn notify_owner(&self, request: &lfg_request::Model, message: &str) {
        let sent = self.platform.notify_user(&request.owner_id, message).await;
        if !sent.is_done() {
            debug!("Could not DM owner of LFG {}: {:?}", request.id, sent);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::announcement::AnnouncementState;
    use crate::errors::Result;
    use crate::test_utils::*;

    async fn setup(
        platform: Arc<FakePlatform>,
    ) -> Result<(SquadManager, ResourceProvisioner, lfg_request::Model)> {
        let db = setup_test_db().await?;
        let squads = SquadManager::new(db);
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        Ok((squads, ResourceProvisioner::new(platform), request))
    }

    #[tokio::test]
    async fn test_provision_attaches_voice_and_announcement() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;

        let report = provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        assert!(report.notices.is_empty());
        let voice_id = report.request.voice_channel_id.clone().unwrap();
        assert_eq!(report.request.announcement_channel_id.as_deref(), Some("announcements"));
        assert!(report.request.announcement_message_id.is_some());

        let stored = squads.get(&report.request.id).await?;
        assert_eq!(stored, report.request);

        let calls = platform.calls();
        assert!(calls.contains(&"create_voice:🎮 Zero-Dam-Easy-LF2".to_string()));
        assert!(calls.contains(&format!("move:owner:{voice_id}")));
        // The announcement already mentions the voice channel
        let sent = platform.last_announcement().unwrap();
        assert_eq!(sent.embed.fields[7].value, format!("<#{voice_id}>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_voice_failure_does_not_block_announcement() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        platform.script("create_voice", FakeOutcome::Denied);
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;

        let report = provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        assert_eq!(report.notices.len(), 1);
        assert!(report.notices[0].contains("voice channel"));
        assert!(report.request.voice_channel_id.is_none());
        assert!(report.request.announcement_message_id.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_announcement_failure_is_reported() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        platform.script("send_announcement", FakeOutcome::NotFound);
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;

        let report = provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        assert_eq!(report.notices.len(), 1);
        assert!(report.notices[0].contains("announcement"));
        assert!(report.request.voice_channel_id.is_some());
        assert!(report.request.announcement_message_id.is_none());
        // The request itself is untouched
        assert!(squads.get(&report.request.id).await?.is_active());
        Ok(())
    }

    #[tokio::test]
    async fn test_platform_errors_ask_to_retry() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        platform.script("create_voice", FakeOutcome::Failed);
        platform.script("send_announcement", FakeOutcome::Failed);
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;

        let report = provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        assert_eq!(
            report.notices,
            vec![
                "⚠️ Could not create a voice channel for your squad. Please try again later."
                    .to_string(),
                "⚠️ Could not post the announcement. Please try again later.".to_string(),
            ]
        );
        let stored = squads.get(&report.request.id).await?;
        assert!(stored.is_active());
        assert!(stored.voice_channel_id.is_none());
        assert!(stored.announcement_message_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_request_gets_no_resources() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;
        squads.close(&guard).await?;

        let report = provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        // The channel made before the close was noticed is removed again
        let calls = platform.calls();
        assert!(calls.contains(&"create_voice:🎮 Zero-Dam-Easy-LF2".to_string()));
        assert!(calls.contains(&"delete_channel:vc1".to_string()));
        assert!(!calls.iter().any(|call| call.starts_with("send_announcement")));
        assert!(platform.last_announcement().is_none());

        let stored = squads.get(&report.request.id).await?;
        assert_eq!(stored.status, crate::entities::LfgStatus::Closed);
        assert!(stored.voice_channel_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_uses_latest_record() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;
        provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;

        squads.join_squad(&guard, "u2", "u2#0002").await?;
        squads.join_squad(&guard, "u3", "u3#0003").await?;
        let result = provisioner.sync_announcement(&squads, &guard, None).await;
        assert!(result.is_done());

        let edited = platform.last_announcement().unwrap();
        assert_eq!(edited.state, AnnouncementState::Full);
        assert_eq!(edited.embed.fields[8].name, "Squad Members (3/3)");
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_without_announcement_is_noop() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;

        assert!(provisioner.sync_announcement(&squads, &guard, None).await.is_done());
        assert!(platform.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_teardown_treats_not_found_as_done() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;
        provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;
        let closed = squads.close(&guard).await?.into_request();

        platform.script("edit_announcement", FakeOutcome::NotFound);
        platform.script("delete_channel", FakeOutcome::NotFound);
        let notices = provisioner.teardown(&closed, None).await;
        assert!(notices.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_teardown_reports_denied() -> Result<()> {
        let platform = Arc::new(FakePlatform::new());
        let (squads, provisioner, request) = setup(Arc::clone(&platform)).await?;
        let guard = squads.lock_request(&request.id).await;
        provisioner
            .provision_created(&squads, &guard, request, &sample_guild_config("g1"))
            .await;
        let closed = squads.close(&guard).await?.into_request();

        platform.script("delete_channel", FakeOutcome::Denied);
        let notices = provisioner.teardown(&closed, None).await;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("voice channel"));

        let edited = platform.last_announcement().unwrap();
        assert_eq!(edited.state, AnnouncementState::Closed);
        assert!(edited.buttons.is_empty());
        Ok(())
    }

    #[test]
    fn test_failure_notices() {
        assert_eq!(BestEffort::Done(()).failure_notice("x"), None);
        assert!(
            BestEffort::<()>::Denied("403".to_string())
                .failure_notice("post")
                .unwrap()
                .contains("permissions")
        );
        assert!(
            BestEffort::<()>::NotFound
                .failure_notice("post")
                .unwrap()
                .contains("no longer exists")
        );
    }
}
