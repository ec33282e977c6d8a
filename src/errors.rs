//! Unified error type for `LfgBuddy`.
//!
//! Variants fall into three groups: precondition failures that are reported to the
//! initiating user and never mutate state, record validation failures that reject a
//! write, and infrastructure failures (database, configuration, framework).

use thiserror::Error;

/// All errors surfaced by the core and bot layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Persistence failure reported by `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// String formatting failure while building a message
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/Poise failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),

    /// The interaction did not happen inside a guild
    #[error("This action can only be used in a server")]
    GuildOnly,

    /// No guild configuration has been saved for this guild
    #[error("LFG is not configured for guild {guild_id}")]
    GuildNotConfigured {
        /// Guild that lacks a configuration
        guild_id: String,
    },

    /// The saved guild configuration points at resources that no longer work
    #[error("LFG configuration for guild {guild_id} is invalid: {reason}")]
    GuildConfigInvalid {
        /// Guild whose configuration failed verification
        guild_id: String,
        /// Which configured resource failed
        reason: String,
    },

    /// No LFG request with this ID exists
    #[error("LFG request not found: {request_id}")]
    RequestNotFound {
        /// Requested ID
        request_id: String,
    },

    /// The LFG request is closed and accepts no further membership changes
    #[error("LFG request {request_id} is no longer active")]
    RequestClosed {
        /// Closed request ID
        request_id: String,
    },

    /// Only the owner may perform this action
    #[error("User {user_id} does not own LFG request {request_id}")]
    NotOwner {
        /// Request ID
        request_id: String,
        /// User who attempted the action
        user_id: String,
    },

    /// The squad is at capacity
    #[error("Squad for LFG request {request_id} is full")]
    SquadFull {
        /// Full request ID
        request_id: String,
    },

    /// The owner tried to leave their own squad
    #[error("The owner of LFG request {request_id} must close it instead of leaving")]
    OwnerCannotLeave {
        /// Request ID
        request_id: String,
    },

    /// The owner already has an active request in this guild
    #[error("An active LFG request already exists: {request_id}")]
    ActiveRequestExists {
        /// ID of the existing active request
        request_id: String,
    },

    /// Confirm was attempted before all required wizard fields were set
    #[error("Selection incomplete, missing: {}", missing.join(", "))]
    IncompleteSelection {
        /// Human-readable names of the missing fields
        missing: Vec<&'static str>,
    },

    /// A wizard selection value was not acceptable
    #[error("Invalid selection: {message}")]
    InvalidSelection {
        /// Why the selection was rejected
        message: String,
    },

    /// The map/difficulty pair is not in rotation at this hour
    #[error("{map} ({difficulty}) is not available at {hour}:00 UTC")]
    Unavailable {
        /// Map label
        map: &'static str,
        /// Difficulty label
        difficulty: &'static str,
        /// UTC hour that was checked
        hour: u8,
    },

    /// A record failed schema validation and was not written
    #[error("Validation failed: {message}")]
    Validation {
        /// Which rule was violated
        message: String,
    },
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Whether this error is a user-facing precondition failure rather than a fault.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::GuildOnly
                | Self::GuildNotConfigured { .. }
                | Self::GuildConfigInvalid { .. }
                | Self::RequestNotFound { .. }
                | Self::RequestClosed { .. }
                | Self::NotOwner { .. }
                | Self::SquadFull { .. }
                | Self::OwnerCannotLeave { .. }
                | Self::ActiveRequestExists { .. }
                | Self::IncompleteSelection { .. }
                | Self::InvalidSelection { .. }
                | Self::Unavailable { .. }
        )
    }

    /// Short, non-technical text shown privately to the user who triggered the error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::GuildOnly => "❌ This can only be used in a server.".to_string(),
            Self::GuildNotConfigured { .. } => "❌ LFG isn't set up on this server yet. \
                                                An administrator needs to run `/setup_lfg` first."
                .to_string(),
            Self::GuildConfigInvalid { reason, .. } => format!(
                "❌ The LFG configuration for this server is invalid ({reason}). Please ask an administrator to re-run `/setup_lfg`."
            ),
            Self::RequestNotFound { .. } => "This LFG request no longer exists.".to_string(),
            Self::RequestClosed { .. } => "This LFG request is no longer active.".to_string(),
            Self::NotOwner { .. } => "Only the owner can do that for this LFG request.".to_string(),
            Self::SquadFull { .. } => "This squad is already full.".to_string(),
            Self::OwnerCannotLeave { .. } => {
                "As the owner, you can't leave your own squad. Close the request instead.".to_string()
            }
            Self::ActiveRequestExists { .. } => "You already have an active LFG request. \
                                                 Please close it before creating a new one."
                .to_string(),
            Self::IncompleteSelection { missing } => format!(
                "Some selections are missing: {}. Please complete all required dropdowns.",
                missing.join(", ")
            ),
            Self::InvalidSelection { message } => format!("⚠️ {message}"),
            Self::Unavailable {
                map, difficulty, ..
            } => format!(
                "⚠️ {map} ({difficulty}) is not in rotation right now. Please pick another combination."
            ),
            Self::Validation { .. } => {
                "⚠️ Something went wrong while saving your changes. Please try again.".to_string()
            }
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Fmt(_)
            | Self::FrameworkError(_) => {
                "❌ An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(Error::GuildOnly.is_precondition());
        assert!(
            Error::SquadFull {
                request_id: "r1".to_string()
            }
            .is_precondition()
        );
        assert!(
            !Error::Validation {
                message: "bad".to_string()
            }
            .is_precondition()
        );
        assert!(
            !Error::Config {
                message: "bad".to_string()
            }
            .is_precondition()
        );
    }

    #[test]
    fn test_user_message_hides_internal_identifiers() {
        let err = Error::NotOwner {
            request_id: "01HXYZ".to_string(),
            user_id: "42".to_string(),
        };
        let message = err.user_message();
        assert!(!message.contains("01HXYZ"));
        assert!(!message.contains("42"));

        let err = Error::Validation {
            message: "members exceed squad size".to_string(),
        };
        assert!(!err.user_message().contains("squad size"));
    }

    #[test]
    fn test_incomplete_selection_lists_missing_fields() {
        let err = Error::IncompleteSelection {
            missing: vec!["Objective Type", "Loadout Type"],
        };
        assert_eq!(
            err.to_string(),
            "Selection incomplete, missing: Objective Type, Loadout Type"
        );
        assert!(err.user_message().contains("Objective Type, Loadout Type"));
    }
}
