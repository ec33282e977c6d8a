//! LFG request store - Persistence of request records.
//!
//! Records are read by ID or by (guild, status) and (guild, owner, status). Writes are
//! either a whole-record insert/replace keyed by ID, or the narrow resource-reference
//! update used by the provisioner. Every write validates the resulting record first;
//! a record that fails validation is logged and never reaches the database.

use crate::{
    core::squad::MAX_NEEDED_CLASSES,
    entities::{LfgRequest, LfgStatus, lfg_request},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashSet;
use tracing::{debug, error};

/// External resource recorded on a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceRef {
    /// Voice channel created for the squad
    Voice {
        /// Channel ID
        channel_id: String,
    },
    /// Announcement message posted for the squad
    Announcement {
        /// Channel holding the message
        channel_id: String,
        /// Message ID
        message_id: String,
    },
}

/// Retrieves a request by ID.
pub async fn get_request_by_id(
    db: &DatabaseConnection,
    request_id: &str,
) -> Result<Option<lfg_request::Model>> {
    LfgRequest::find_by_id(request_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a guild's requests with the given status, oldest first.
pub async fn get_requests_by_status(
    db: &DatabaseConnection,
    guild_id: &str,
    status: LfgStatus,
) -> Result<Vec<lfg_request::Model>> {
    LfgRequest::find()
        .filter(lfg_request::Column::GuildId.eq(guild_id))
        .filter(lfg_request::Column::Status.eq(status))
        .order_by_asc(lfg_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the owner's active requests in a guild.
///
/// More than one entry means the one-active-request rule was broken outside this crate.
pub async fn get_active_requests_for_owner(
    db: &DatabaseConnection,
    guild_id: &str,
    owner_id: &str,
) -> Result<Vec<lfg_request::Model>> {
    LfgRequest::find()
        .filter(lfg_request::Column::GuildId.eq(guild_id))
        .filter(lfg_request::Column::OwnerId.eq(owner_id))
        .filter(lfg_request::Column::Status.eq(LfgStatus::Active))
        .order_by_asc(lfg_request::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Checks every structural rule of a request record.
pub fn validate(record: &lfg_request::Model) -> Result<()> {
    let fail = |message: String| -> Result<()> { Err(Error::Validation { message }) };

    if record.id.trim().is_empty() {
        return fail("request id is empty".to_string());
    }
    if record.guild_id.is_empty() || record.owner_id.is_empty() {
        return fail("guild and owner ids are required".to_string());
    }
    if record.squad_size < 1 {
        return fail(format!("squad size {} is not positive", record.squad_size));
    }
    if record.members.len() > usize::try_from(record.squad_size).unwrap_or(0) {
        return fail(format!(
            "{} members exceed squad size {}",
            record.members.len(),
            record.squad_size
        ));
    }

    let mut seen = HashSet::new();
    if !record.members.0.iter().all(|member| seen.insert(member.id.as_str())) {
        return fail("duplicate squad member".to_string());
    }

    if record.is_active()
        && record
            .members
            .0
            .first()
            .is_none_or(|first| first.id != record.owner_id)
    {
        return fail("owner must be the first squad member".to_string());
    }

    let classes = &record.needed_classes.0;
    if classes.len() > MAX_NEEDED_CLASSES {
        return fail(format!("{} needed classes exceed the maximum", classes.len()));
    }
    if classes.iter().enumerate().any(|(i, class)| classes[..i].contains(class)) {
        return fail("duplicate needed class".to_string());
    }

    match (record.status, record.closed_at) {
        (LfgStatus::Active, Some(_)) => return fail("active request has a close time".to_string()),
        (LfgStatus::Closed, None) => return fail("closed request has no close time".to_string()),
        _ => {}
    }

    if record.announcement_channel_id.is_some() != record.announcement_message_id.is_some() {
        return fail("announcement channel and message must be set together".to_string());
    }

    Ok(())
}

fn validate_for_write(record: &lfg_request::Model) -> Result<()> {
    validate(record).inspect_err(|e| {
        error!("Rejected write of LFG request {}: {}", record.id, e);
    })
}

/// Builds an active model with every column set from `record`.
fn full_active_model(record: lfg_request::Model) -> lfg_request::ActiveModel {
    lfg_request::ActiveModel {
        id: Set(record.id),
        guild_id: Set(record.guild_id),
        owner_id: Set(record.owner_id),
        owner_tag: Set(record.owner_tag),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
        closed_at: Set(record.closed_at),
        mode: Set(record.mode),
        squad_size: Set(record.squad_size),
        map: Set(record.map),
        difficulty: Set(record.difficulty),
        ranked_status: Set(record.ranked_status),
        objective_type: Set(record.objective_type),
        loadout_type: Set(record.loadout_type),
        needed_classes: Set(record.needed_classes),
        status: Set(record.status),
        members: Set(record.members),
        voice_channel_id: Set(record.voice_channel_id),
        announcement_channel_id: Set(record.announcement_channel_id),
        announcement_message_id: Set(record.announcement_message_id),
    }
}

fn not_found_on_missing_row(request_id: &str, err: DbErr) -> Error {
    match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => Error::RequestNotFound {
            request_id: request_id.to_string(),
        },
        other => other.into(),
    }
}

/// Inserts a new request after validating it.
pub async fn insert_request(
    db: &DatabaseConnection,
    record: lfg_request::Model,
) -> Result<lfg_request::Model> {
    validate_for_write(&record)?;
    let inserted = full_active_model(record).insert(db).await?;
    debug!("Inserted LFG request {}", inserted.id);
    Ok(inserted)
}

/// Replaces a stored request with `record` (matched by ID) after validating it.
pub async fn replace_request(
    db: &DatabaseConnection,
    mut record: lfg_request::Model,
) -> Result<lfg_request::Model> {
    record.updated_at = Utc::now();
    validate_for_write(&record)?;
    let request_id = record.id.clone();
    full_active_model(record)
        .update(db)
        .await
        .map_err(|e| not_found_on_missing_row(&request_id, e))
}

/// Deletes a request by ID. Returns whether a row was removed.
///
/// The bot closes requests instead of deleting them; this exists for maintenance.
pub async fn delete_request(db: &DatabaseConnection, request_id: &str) -> Result<bool> {
    let result = LfgRequest::delete_by_id(request_id.to_string()).exec(db).await?;
    if result.rows_affected > 0 {
        debug!("Deleted LFG request {}", request_id);
    }
    Ok(result.rows_affected > 0)
}

/// Records a provisioned resource on a request.
///
/// Only the resource reference columns and `updated_at` are written, so this path can
/// never change membership or status.
pub async fn update_resource_refs(
    db: &DatabaseConnection,
    request_id: &str,
    resource: ResourceRef,
) -> Result<lfg_request::Model> {
    let mut candidate = get_request_by_id(db, request_id)
        .await?
        .ok_or_else(|| Error::RequestNotFound {
            request_id: request_id.to_string(),
        })?;

    let now = Utc::now();
    let mut active = lfg_request::ActiveModel {
        id: Set(request_id.to_string()),
        updated_at: Set(now),
        ..Default::default()
    };
    candidate.updated_at = now;
    match resource {
        ResourceRef::Voice { channel_id } => {
            candidate.voice_channel_id = Some(channel_id.clone());
            active.voice_channel_id = Set(Some(channel_id));
        }
        ResourceRef::Announcement {
            channel_id,
            message_id,
        } => {
            candidate.announcement_channel_id = Some(channel_id.clone());
            candidate.announcement_message_id = Some(message_id.clone());
            active.announcement_channel_id = Set(Some(channel_id));
            active.announcement_message_id = Set(Some(message_id));
        }
    }
    validate_for_write(&candidate)?;

    active
        .update(db)
        .await
        .map_err(|e| not_found_on_missing_row(request_id, e))
}
