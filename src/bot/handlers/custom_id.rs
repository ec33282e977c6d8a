//! Component custom ids.
//!
//! Every button and select menu the bot sends carries a custom id built here, and every
//! component interaction is parsed back into an [`LfgComponent`] exactly once before
//! dispatch.

use crate::core::wizard::WizardField;

const MAP_SELECT: &str = "lfg-map-select";
const DIFFICULTY_SELECT: &str = "lfg-difficulty-select";
const RANKED_SELECT: &str = "lfg-ranked-select";
const OBJECTIVE_SELECT: &str = "lfg-objective-select";
const LOADOUT_SELECT: &str = "lfg-loadout-select";
const CLASSES_SELECT: &str = "lfg-classes-select";
const CREATE_CONFIRM: &str = "lfg-create-confirm";
const CREATE_CANCEL: &str = "lfg-create-cancel";
const CANCEL_CREATION: &str = "lfg-cancel-creation";
const CLOSE_CANCEL: &str = "lfg-close-cancel";

const JOIN_PREFIX: &str = "lfg-join-";
const LEAVE_PREFIX: &str = "lfg-leave-";
const CLOSE_CONFIRM_PREFIX: &str = "lfg-close-confirm-";
const CLOSE_EXISTING_PREFIX: &str = "lfg-close-existing-";

/// A parsed LFG component interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LfgComponent {
    /// A wizard select menu
    Select(WizardField),
    /// Commit the wizard draft
    CreateConfirm,
    /// Abandon the wizard draft
    CreateCancel,
    /// Dismiss the "you already have an active request" prompt
    CancelCreation,
    /// Join a squad
    Join(String),
    /// Leave a squad
    Leave(String),
    /// Confirm closing a request
    CloseConfirm(String),
    /// Dismiss the close prompt
    CloseCancel,
    /// Close the caller's existing request from the create prompt
    CloseExisting(String),
}

impl LfgComponent {
    /// Parses a custom id. Returns `None` for ids this bot did not issue or that carry
    /// an empty request id.
    #[must_use]
    pub fn parse(custom_id: &str) -> Option<Self> {
        let fixed = match custom_id {
            MAP_SELECT => Some(Self::Select(WizardField::Map)),
            DIFFICULTY_SELECT => Some(Self::Select(WizardField::Difficulty)),
            RANKED_SELECT => Some(Self::Select(WizardField::RankedStatus)),
            OBJECTIVE_SELECT => Some(Self::Select(WizardField::ObjectiveType)),
            LOADOUT_SELECT => Some(Self::Select(WizardField::LoadoutType)),
            CLASSES_SELECT => Some(Self::Select(WizardField::NeededClasses)),
            CREATE_CONFIRM => Some(Self::CreateConfirm),
            CREATE_CANCEL => Some(Self::CreateCancel),
            CANCEL_CREATION => Some(Self::CancelCreation),
            CLOSE_CANCEL => Some(Self::CloseCancel),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        // Longer prefixes first: "lfg-close-confirm-" must not be read as a request id
        // under some shorter prefix.
        let with_id: [(&str, fn(String) -> Self); 4] = [
            (CLOSE_CONFIRM_PREFIX, Self::CloseConfirm),
            (CLOSE_EXISTING_PREFIX, Self::CloseExisting),
            (LEAVE_PREFIX, Self::Leave),
            (JOIN_PREFIX, Self::Join),
        ];
        with_id.into_iter().find_map(|(prefix, build)| {
            custom_id
                .strip_prefix(prefix)
                .filter(|id| !id.is_empty())
                .map(|id| build(id.to_string()))
        })
    }

    /// The custom id to put on the component.
    #[must_use]
    pub fn custom_id(&self) -> String {
        match self {
            Self::Select(field) => select_id(*field).to_string(),
            Self::CreateConfirm => CREATE_CONFIRM.to_string(),
            Self::CreateCancel => CREATE_CANCEL.to_string(),
            Self::CancelCreation => CANCEL_CREATION.to_string(),
            Self::CloseCancel => CLOSE_CANCEL.to_string(),
            Self::Join(id) => format!("{JOIN_PREFIX}{id}"),
            Self::Leave(id) => format!("{LEAVE_PREFIX}{id}"),
            Self::CloseConfirm(id) => format!("{CLOSE_CONFIRM_PREFIX}{id}"),
            Self::CloseExisting(id) => format!("{CLOSE_EXISTING_PREFIX}{id}"),
        }
    }
}

const fn select_id(field: WizardField) -> &'static str {
    match field {
        WizardField::Map => MAP_SELECT,
        WizardField::Difficulty => DIFFICULTY_SELECT,
        WizardField::RankedStatus => RANKED_SELECT,
        WizardField::ObjectiveType => OBJECTIVE_SELECT,
        WizardField::LoadoutType => LOADOUT_SELECT,
        WizardField::NeededClasses => CLASSES_SELECT,
    }
}
