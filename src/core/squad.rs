//! Squad lifecycle - Creating requests and changing their membership.
//!
//! Rules enforced here:
//! - one active request per (guild, owner); checked and inserted under a per-owner lock
//! - the roster never exceeds the squad size, and the owner stays first
//! - the owner cannot leave, only close
//! - a closed request accepts no membership change, and closing again is a no-op
//!
//! Mutations require a [`RequestGuard`] from [`SquadManager::lock_request`], so two
//! changes to the same request never interleave. Ownership checks for `close` belong to
//! the caller.

use crate::{
    core::{
        draft::LfgParams,
        locks::{KeyedLocks, RequestGuard},
        store::{self, ResourceRef},
    },
    entities::{LfgStatus, NeededClasses, SquadMember, SquadMembers, lfg_request},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};
use uuid::Uuid;

/// Squad capacity, owner included.
pub const SQUAD_SIZE: i32 = 3;
/// Game mode shown on every request.
pub const MODE_LABEL: &str = "Operations";
/// Most class tags a request may ask for.
pub const MAX_NEEDED_CLASSES: usize = 2;

/// Result of a join attempt that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum JoinOutcome {
    /// The user was added
    Joined(lfg_request::Model),
    /// The user was already on the roster; nothing changed
    AlreadyMember(lfg_request::Model),
}

/// Result of a leave attempt that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum LeaveOutcome {
    /// The user was removed
    Left(lfg_request::Model),
    /// The user was not on the roster; nothing changed
    NotMember(lfg_request::Model),
}

/// Result of closing a request.
#[derive(Clone, Debug, PartialEq)]
pub enum CloseOutcome {
    /// The request was active and is now closed
    Closed(lfg_request::Model),
    /// The request was already closed; returned unchanged
    AlreadyClosed(lfg_request::Model),
}

macro_rules! outcome_accessors {
    ($ty:ident, $changed:ident, $unchanged:ident) => {
        impl $ty {
            /// The request after the operation
            #[must_use]
            pub const fn request(&self) -> &lfg_request::Model {
                match self {
                    Self::$changed(request) | Self::$unchanged(request) => request,
                }
            }

            /// Consumes the outcome, returning the request
            #[must_use]
            pub fn into_request(self) -> lfg_request::Model {
                match self {
                    Self::$changed(request) | Self::$unchanged(request) => request,
                }
            }

            /// Whether the stored record changed
            #[must_use]
            pub const fn changed(&self) -> bool {
                matches!(self, Self::$changed(_))
            }
        }
    };
}

outcome_accessors!(JoinOutcome, Joined, AlreadyMember);
outcome_accessors!(LeaveOutcome, Left, NotMember);
outcome_accessors!(CloseOutcome, Closed, AlreadyClosed);

/// Builds a fresh active request with the owner as sole member.
#[must_use]
pub fn new_request(
    guild_id: &str,
    owner_id: &str,
    owner_tag: &str,
    params: LfgParams,
    now: DateTime<Utc>,
) -> lfg_request::Model {
    lfg_request::Model {
        id: Uuid::new_v4().to_string(),
        guild_id: guild_id.to_string(),
        owner_id: owner_id.to_string(),
        owner_tag: owner_tag.to_string(),
        created_at: now,
        updated_at: now,
        closed_at: None,
        mode: MODE_LABEL.to_string(),
        squad_size: SQUAD_SIZE,
        map: params.map,
        difficulty: params.difficulty,
        ranked_status: params.ranked_status,
        objective_type: params.objective_type,
        loadout_type: params.loadout_type,
        needed_classes: NeededClasses(params.needed_classes),
        status: LfgStatus::Active,
        members: SquadMembers(vec![SquadMember {
            id: owner_id.to_string(),
            tag: owner_tag.to_string(),
            joined_at: now,
        }]),
        voice_channel_id: None,
        announcement_channel_id: None,
        announcement_message_id: None,
    }
}

/// Adds `user_id` to the roster.
pub fn apply_join(
    mut request: lfg_request::Model,
    user_id: &str,
    user_tag: &str,
    now: DateTime<Utc>,
) -> Result<JoinOutcome> {
    if !request.is_active() {
        return Err(Error::RequestClosed {
            request_id: request.id,
        });
    }
    if request.members.contains(user_id) {
        return Ok(JoinOutcome::AlreadyMember(request));
    }
    if request.is_full() {
        return Err(Error::SquadFull {
            request_id: request.id,
        });
    }
    request.members.0.push(SquadMember {
        id: user_id.to_string(),
        tag: user_tag.to_string(),
        joined_at: now,
    });
    request.updated_at = now;
    Ok(JoinOutcome::Joined(request))
}

/// Removes `user_id` from the roster.
pub fn apply_leave(
    mut request: lfg_request::Model,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<LeaveOutcome> {
    if !request.is_active() {
        return Err(Error::RequestClosed {
            request_id: request.id,
        });
    }
    if request.owner_id == user_id {
        return Err(Error::OwnerCannotLeave {
            request_id: request.id,
        });
    }
    if !request.members.contains(user_id) {
        return Ok(LeaveOutcome::NotMember(request));
    }
    request.members.0.retain(|member| member.id != user_id);
    request.updated_at = now;
    Ok(LeaveOutcome::Left(request))
}

/// Marks the request closed.
#[must_use]
pub fn apply_close(mut request: lfg_request::Model, now: DateTime<Utc>) -> CloseOutcome {
    if !request.is_active() {
        return CloseOutcome::AlreadyClosed(request);
    }
    request.status = LfgStatus::Closed;
    request.closed_at = Some(now);
    request.updated_at = now;
    CloseOutcome::Closed(request)
}

/// Enforces the request lifecycle over the store.
#[derive(Debug)]
pub struct SquadManager {
    db: DatabaseConnection,
    owner_locks: KeyedLocks,
    request_locks: KeyedLocks,
}

impl SquadManager {
    /// Creates a manager over `db`.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            owner_locks: KeyedLocks::new(),
            request_locks: KeyedLocks::new(),
        }
    }

    /// Database handle
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates a request for `owner_id`, refusing if they already have an active one.
    pub async fn create_request(
        &self,
        guild_id: &str,
        owner_id: &str,
        owner_tag: &str,
        params: LfgParams,
    ) -> Result<lfg_request::Model> {
        let (request, _guard) = self
            .create_locked_request(guild_id, owner_id, owner_tag, params)
            .await?;
        Ok(request)
    }

    /// Like [`Self::create_request`], but also returns the new request's lock.
    ///
    /// The check and the insert run under a lock keyed by (guild, owner), so concurrent
    /// create attempts by the same owner cannot both succeed. The request lock is taken
    /// before the owner lock is released, so nothing can close the request before the
    /// caller has provisioned it.
    pub async fn create_locked_request(
        &self,
        guild_id: &str,
        owner_id: &str,
        owner_tag: &str,
        params: LfgParams,
    ) -> Result<(lfg_request::Model, RequestGuard)> {
        let _owner_lock = self
            .owner_locks
            .lock(&format!("{guild_id}:{owner_id}"))
            .await;

        let existing = store::get_active_requests_for_owner(&self.db, guild_id, owner_id).await?;
        if let Some(active) = existing.first() {
            if existing.len() > 1 {
                warn!(
                    "Owner {} has {} active requests in guild {}",
                    owner_id,
                    existing.len(),
                    guild_id
                );
            }
            return Err(Error::ActiveRequestExists {
                request_id: active.id.clone(),
            });
        }

        let request = new_request(guild_id, owner_id, owner_tag, params, Utc::now());
        let request = store::insert_request(&self.db, request).await?;
        let guard = self.lock_request(&request.id).await;
        info!(
            "Created LFG request {} for {} in guild {}",
            request.id, owner_tag, guild_id
        );
        Ok((request, guard))
    }

    /// Waits for exclusive access to one request.
    pub async fn lock_request(&self, request_id: &str) -> RequestGuard {
        let guard = self.request_locks.lock(request_id).await;
        RequestGuard::new(request_id.to_string(), guard)
    }

    /// Loads a request, failing with `RequestNotFound` if it does not exist.
    pub async fn get(&self, request_id: &str) -> Result<lfg_request::Model> {
        store::get_request_by_id(&self.db, request_id)
            .await?
            .ok_or_else(|| Error::RequestNotFound {
                request_id: request_id.to_string(),
            })
    }

    /// The owner's active request in a guild, if any.
    pub async fn active_request_for_owner(
        &self,
        guild_id: &str,
        owner_id: &str,
    ) -> Result<Option<lfg_request::Model>> {
        Ok(store::get_active_requests_for_owner(&self.db, guild_id, owner_id)
            .await?
            .into_iter()
            .next())
    }

    /// Adds a member to the locked request.
    pub async fn join_squad(
        &self,
        guard: &RequestGuard,
        user_id: &str,
        user_tag: &str,
    ) -> Result<JoinOutcome> {
        let request = self.get(guard.request_id()).await?;
        match apply_join(request, user_id, user_tag, Utc::now())? {
            JoinOutcome::Joined(request) => {
                let request = store::replace_request(&self.db, request).await?;
                info!("{} joined LFG request {}", user_tag, request.id);
                Ok(JoinOutcome::Joined(request))
            }
            unchanged @ JoinOutcome::AlreadyMember(_) => Ok(unchanged),
        }
    }

    /// Removes a non-owner member from the locked request.
    pub async fn leave_squad(&self, guard: &RequestGuard, user_id: &str) -> Result<LeaveOutcome> {
        let request = self.get(guard.request_id()).await?;
        match apply_leave(request, user_id, Utc::now())? {
            LeaveOutcome::Left(request) => {
                let request = store::replace_request(&self.db, request).await?;
                info!("{} left LFG request {}", user_id, request.id);
                Ok(LeaveOutcome::Left(request))
            }
            unchanged @ LeaveOutcome::NotMember(_) => Ok(unchanged),
        }
    }

    /// Closes the locked request. Closing a closed request returns it unchanged.
    pub async fn close(&self, guard: &RequestGuard) -> Result<CloseOutcome> {
        let request = self.get(guard.request_id()).await?;
        match apply_close(request, Utc::now()) {
            CloseOutcome::Closed(request) => {
                let request = store::replace_request(&self.db, request).await?;
                info!("Closed LFG request {}", request.id);
                Ok(CloseOutcome::Closed(request))
            }
            unchanged @ CloseOutcome::AlreadyClosed(_) => Ok(unchanged),
        }
    }

    /// Records a provisioned resource on the locked request.
    ///
    /// Only resource references are written. Closed requests are refused so a late
    /// provisioning result cannot resurrect references after teardown.
    pub async fn attach_resource(
        &self,
        guard: &RequestGuard,
        resource: ResourceRef,
    ) -> Result<lfg_request::Model> {
        let request = self.get(guard.request_id()).await?;
        if !request.is_active() {
            return Err(Error::RequestClosed {
                request_id: request.id,
            });
        }
        store::update_resource_refs(&self.db, guard.request_id(), resource).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use std::sync::Arc;

    async fn manager() -> Result<SquadManager> {
        Ok(SquadManager::new(setup_test_db().await?))
    }

    #[tokio::test]
    async fn test_create_request_sets_owner_as_sole_member() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;

        assert_eq!(request.status, LfgStatus::Active);
        assert_eq!(request.squad_size, SQUAD_SIZE);
        assert_eq!(request.mode, MODE_LABEL);
        assert_eq!(request.members.len(), 1);
        assert_eq!(request.members.0[0].id, "owner");
        assert_eq!(request.members.0[0].tag, "owner#0001");
        assert!(request.closed_at.is_none());
        assert!(request.voice_channel_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_second_active_request_refused() -> Result<()> {
        let squads = manager().await?;
        let first = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;

        let result = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await;
        assert!(matches!(
            result,
            Err(Error::ActiveRequestExists { ref request_id }) if *request_id == first.id
        ));

        // Other guilds are independent
        squads
            .create_request("g2", "owner", "owner#0001", sample_params())
            .await?;

        // Closing frees the slot
        let guard = squads.lock_request(&first.id).await;
        squads.close(&guard).await?;
        drop(guard);
        squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_active_request() -> Result<()> {
        let squads = Arc::new(manager().await?);
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let squads = Arc::clone(&squads);
            tasks.push(tokio::spawn(async move {
                squads
                    .create_request("g1", "owner", "owner#0001", sample_params())
                    .await
            }));
        }

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(Error::ActiveRequestExists { .. }) => {}
                Err(other) => return Err(other),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(
            store::get_active_requests_for_owner(squads.db(), "g1", "owner")
                .await?
                .len(),
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_locked_create_holds_request_lock() -> Result<()> {
        let squads = Arc::new(manager().await?);
        let (request, guard) = squads
            .create_locked_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        assert_eq!(guard.request_id(), request.id);

        let closer = {
            let squads = Arc::clone(&squads);
            let request_id = request.id.clone();
            tokio::spawn(async move {
                let guard = squads.lock_request(&request_id).await;
                squads.close(&guard).await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!closer.is_finished());
        assert!(squads.get(&request.id).await?.is_active());

        drop(guard);
        let closed = closer.await.unwrap()?;
        assert!(closed.changed());
        Ok(())
    }

    #[tokio::test]
    async fn test_join_until_full() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        let guard = squads.lock_request(&request.id).await;

        let outcome = squads.join_squad(&guard, "u2", "u2#0002").await?;
        assert!(outcome.changed());
        assert_eq!(outcome.request().members.len(), 2);
        assert!(!outcome.request().is_full());

        // Joining again changes nothing
        let outcome = squads.join_squad(&guard, "u2", "u2#0002").await?;
        assert!(matches!(outcome, JoinOutcome::AlreadyMember(_)));
        assert_eq!(outcome.request().members.len(), 2);

        let outcome = squads.join_squad(&guard, "u3", "u3#0003").await?;
        assert!(outcome.request().is_full());

        let result = squads.join_squad(&guard, "u4", "u4#0004").await;
        assert!(matches!(result, Err(Error::SquadFull { .. })));
        assert_eq!(squads.get(&request.id).await?.members.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_leave_rules() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        let guard = squads.lock_request(&request.id).await;
        squads.join_squad(&guard, "u2", "u2#0002").await?;

        let result = squads.leave_squad(&guard, "owner").await;
        assert!(matches!(result, Err(Error::OwnerCannotLeave { .. })));

        let outcome = squads.leave_squad(&guard, "u2").await?;
        assert!(matches!(outcome, LeaveOutcome::Left(_)));
        assert_eq!(outcome.request().members.len(), 1);

        // Leaving twice is a no-op
        let outcome = squads.leave_squad(&guard, "u2").await?;
        assert!(matches!(outcome, LeaveOutcome::NotMember(_)));
        assert_eq!(outcome.request().members.0[0].id, "owner");
        Ok(())
    }

    #[tokio::test]
    async fn test_leave_frees_a_slot() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        let guard = squads.lock_request(&request.id).await;
        squads.join_squad(&guard, "u2", "u2#0002").await?;
        squads.join_squad(&guard, "u3", "u3#0003").await?;
        squads.leave_squad(&guard, "u2").await?;

        let outcome = squads.join_squad(&guard, "u4", "u4#0004").await?;
        let ids: Vec<_> = outcome
            .request()
            .members
            .0
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["owner", "u3", "u4"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        let guard = squads.lock_request(&request.id).await;
        squads.join_squad(&guard, "u2", "u2#0002").await?;

        let first = squads.close(&guard).await?;
        assert!(first.changed());
        let closed = first.into_request();
        assert_eq!(closed.status, LfgStatus::Closed);
        assert!(closed.closed_at.is_some());

        let second = squads.close(&guard).await?;
        assert!(!second.changed());
        assert_eq!(second.into_request(), closed);

        assert!(matches!(
            squads.join_squad(&guard, "u3", "u3#0003").await,
            Err(Error::RequestClosed { .. })
        ));
        assert!(matches!(
            squads.leave_squad(&guard, "u2").await,
            Err(Error::RequestClosed { .. })
        ));
        assert!(matches!(
            squads
                .attach_resource(
                    &guard,
                    ResourceRef::Voice {
                        channel_id: "vc".to_string()
                    }
                )
                .await,
            Err(Error::RequestClosed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_request_is_not_found() -> Result<()> {
        let squads = manager().await?;
        let guard = squads.lock_request("nope").await;
        assert!(matches!(
            squads.join_squad(&guard, "u2", "u2#0002").await,
            Err(Error::RequestNotFound { .. })
        ));
        assert!(matches!(
            squads.close(&guard).await,
            Err(Error::RequestNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_attach_resource_keeps_membership() -> Result<()> {
        let squads = manager().await?;
        let request = squads
            .create_request("g1", "owner", "owner#0001", sample_params())
            .await?;
        let guard = squads.lock_request(&request.id).await;
        squads.join_squad(&guard, "u2", "u2#0002").await?;

        let updated = squads
            .attach_resource(
                &guard,
                ResourceRef::Voice {
                    channel_id: "vc1".to_string(),
                },
            )
            .await?;
        assert_eq!(updated.voice_channel_id.as_deref(), Some("vc1"));
        assert_eq!(updated.members.len(), 2);
        Ok(())
    }

    /// Replays deterministic operation sequences and checks the roster invariants after
    /// every step.
    #[test]
    fn test_membership_invariants_over_sequences() {
        let users = ["owner", "a", "b", "c", "d"];
        let now = Utc::now();

        for seed in 0u64..64 {
            let mut request = new_request("g1", "owner", "owner#0001", sample_params(), now);
            let mut state = seed + 1;
            for _ in 0..24 {
                // xorshift keeps the sequences reproducible
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let user = users[usize::try_from(state % 5).unwrap()];
                let before = request.clone();

                request = match state % 3 {
                    0 => match apply_join(request, user, user, now) {
                        Ok(outcome) => {
                            if matches!(outcome, JoinOutcome::AlreadyMember(_)) {
                                assert_eq!(*outcome.request(), before);
                            }
                            outcome.into_request()
                        }
                        Err(Error::SquadFull { .. }) => {
                            assert!(before.is_full());
                            before
                        }
                        Err(e) => unreachable!("unexpected join error {e}"),
                    },
                    1 => match apply_leave(request, user, now) {
                        Ok(outcome) => {
                            if matches!(outcome, LeaveOutcome::NotMember(_)) {
                                assert_eq!(*outcome.request(), before);
                            }
                            outcome.into_request()
                        }
                        Err(Error::OwnerCannotLeave { .. }) => {
                            assert_eq!(user, "owner");
                            before
                        }
                        Err(e) => unreachable!("unexpected leave error {e}"),
                    },
                    _ => {
                        // Close a copy: the closed record must be the same on a second close
                        let closed = apply_close(request.clone(), now).into_request();
                        assert_eq!(apply_close(closed.clone(), now).into_request(), closed);
                        request
                    }
                };

                assert!(request.members.len() <= usize::try_from(SQUAD_SIZE).unwrap());
                assert_eq!(request.members.0[0].id, "owner");
                assert!(store::validate(&request).is_ok());
            }
        }
    }
}
