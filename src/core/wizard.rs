//! Wizard controller - The two-step selection flow that precedes request creation.
//!
//! Step 1 collects map, difficulty and ranked status; step 2 collects objective and
//! loadout plus up to two optional needed classes. Every selection re-renders the
//! current step with prior answers pre-selected. Map and difficulty menus are filtered
//! against the rotation table for the hour passed in by the caller.
//!
//! The controller only produces view models ([`WizardView`]); turning them into
//! platform components is the bot layer's job.

use crate::core::draft::{DraftStore, LfgParams, SelectionDraft};
use crate::core::rotation::RotationTable;
use crate::core::squad::MAX_NEEDED_CLASSES;
use crate::entities::{
    Choice, ClassTag, Difficulty, GameMap, LoadoutType, ObjectiveType, RankedStatus,
};
use crate::errors::{Error, Result};
use std::fmt::Write as _;
use tracing::debug;

/// Where a user's draft sits in the wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    /// Nothing selected yet
    Empty,
    /// Some but not all step-1 fields set
    Step1Partial,
    /// Step 1 done, nothing chosen in step 2
    Step1Complete,
    /// Step 2 started but objective or loadout still missing
    Step2Partial,
    /// Every required field set; confirm is offered
    ConfirmReady,
}

impl WizardStep {
    /// Classifies a draft.
    #[must_use]
    pub fn of(draft: &SelectionDraft) -> Self {
        let step1_started =
            draft.map.is_some() || draft.difficulty.is_some() || draft.ranked_status.is_some();
        let step2_started = draft.objective_type.is_some()
            || draft.loadout_type.is_some()
            || !draft.needed_classes.is_empty();

        if draft.is_complete() {
            Self::ConfirmReady
        } else if draft.step1_complete() {
            if step2_started {
                Self::Step2Partial
            } else {
                Self::Step1Complete
            }
        } else if step1_started || step2_started {
            Self::Step1Partial
        } else {
            Self::Empty
        }
    }

    /// Whether the step-2 menus are the ones shown.
    #[must_use]
    pub const fn in_step2(self) -> bool {
        matches!(self, Self::Step1Complete | Self::Step2Partial | Self::ConfirmReady)
    }
}

/// A wizard select menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WizardField {
    /// Map menu
    Map,
    /// Difficulty menu
    Difficulty,
    /// Ranked status menu
    RankedStatus,
    /// Objective menu
    ObjectiveType,
    /// Loadout menu
    LoadoutType,
    /// Needed classes multi-select
    NeededClasses,
}

impl WizardField {
    /// Field name as shown to users
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Map => "Map",
            Self::Difficulty => "Difficulty",
            Self::RankedStatus => "Ranked Status",
            Self::ObjectiveType => "Objective Type",
            Self::LoadoutType => "Loadout Type",
            Self::NeededClasses => "Needed Classes",
        }
    }

    const fn placeholder(self) -> &'static str {
        match self {
            Self::Map => "Select a map",
            Self::Difficulty => "Select a difficulty",
            Self::RankedStatus => "Ranked or not?",
            Self::ObjectiveType => "Select an objective",
            Self::LoadoutType => "Select a loadout",
            Self::NeededClasses => "Needed classes (optional, up to 2)",
        }
    }
}

/// A parsed menu submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Map picked
    Map(GameMap),
    /// Difficulty picked
    Difficulty(Difficulty),
    /// Ranked status picked
    RankedStatus(RankedStatus),
    /// Objective picked
    ObjectiveType(ObjectiveType),
    /// Loadout picked
    LoadoutType(LoadoutType),
    /// Needed classes picked (replaces the previous set)
    NeededClasses(Vec<ClassTag>),
}

impl Selection {
    /// Parses the raw values submitted for `field`.
    ///
    /// Single-valued menus need exactly one known value. Needed classes are
    /// deduplicated; more than two distinct classes is rejected.
    pub fn parse(field: WizardField, values: &[String]) -> Result<Self> {
        match field {
            WizardField::Map => single(field, values).map(Self::Map),
            WizardField::Difficulty => single(field, values).map(Self::Difficulty),
            WizardField::RankedStatus => single(field, values).map(Self::RankedStatus),
            WizardField::ObjectiveType => single(field, values).map(Self::ObjectiveType),
            WizardField::LoadoutType => single(field, values).map(Self::LoadoutType),
            WizardField::NeededClasses => {
                let mut classes = Vec::new();
                for value in values {
                    let class = parse_choice::<ClassTag>(field, value)?;
                    if !classes.contains(&class) {
                        classes.push(class);
                    }
                }
                if classes.len() > MAX_NEEDED_CLASSES {
                    return Err(Error::InvalidSelection {
                        message: format!(
                            "You can pick at most {MAX_NEEDED_CLASSES} needed classes."
                        ),
                    });
                }
                Ok(Self::NeededClasses(classes))
            }
        }
    }

    const fn field(&self) -> WizardField {
        match self {
            Self::Map(_) => WizardField::Map,
            Self::Difficulty(_) => WizardField::Difficulty,
            Self::RankedStatus(_) => WizardField::RankedStatus,
            Self::ObjectiveType(_) => WizardField::ObjectiveType,
            Self::LoadoutType(_) => WizardField::LoadoutType,
            Self::NeededClasses(_) => WizardField::NeededClasses,
        }
    }
}

fn single<T: Choice>(field: WizardField, values: &[String]) -> Result<T> {
    match values {
        [value] => parse_choice(field, value),
        _ => Err(Error::InvalidSelection {
            message: format!("Please pick exactly one {}.", field.label()),
        }),
    }
}

fn parse_choice<T: Choice>(field: WizardField, value: &str) -> Result<T> {
    T::from_label(value).ok_or_else(|| Error::InvalidSelection {
        message: format!("Unknown {} option: {value}", field.label()),
    })
}

/// One option of a rendered menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOption {
    /// Text shown
    pub label: &'static str,
    /// Submitted value
    pub value: &'static str,
    /// Pre-selected because it matches the draft
    pub selected: bool,
}

/// A rendered select menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuView {
    /// Which draft field the menu sets
    pub field: WizardField,
    /// Placeholder text
    pub placeholder: &'static str,
    /// Choices, never empty
    pub options: Vec<MenuOption>,
    /// Minimum number of picks
    pub min_values: u8,
    /// Maximum number of picks
    pub max_values: u8,
}

/// A rendered wizard step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardView {
    /// Step the draft is in
    pub step: WizardStep,
    /// Message text
    pub content: String,
    /// Menus for the current step
    pub menus: Vec<MenuView>,
    /// Whether the confirm action is offered
    pub confirm_ready: bool,
}

impl WizardView {
    /// The menu for `field`, if rendered.
    #[must_use]
    pub fn menu(&self, field: WizardField) -> Option<&MenuView> {
        self.menus.iter().find(|menu| menu.field == field)
    }
}

/// Drives the selection wizard over the shared draft store.
#[derive(Debug)]
pub struct WizardController {
    drafts: DraftStore,
    rotation: RotationTable,
}

impl WizardController {
    /// Creates a controller with an empty draft store.
    #[must_use]
    pub fn new(rotation: RotationTable) -> Self {
        Self {
            drafts: DraftStore::new(),
            rotation,
        }
    }

    /// Draft store, exposed for the idle sweeper.
    #[must_use]
    pub const fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    /// Rotation table in use
    #[must_use]
    pub const fn rotation(&self) -> &RotationTable {
        &self.rotation
    }

    /// Renders the user's current draft, or an empty step 1 when there is none.
    pub async fn start(&self, user_id: &str, hour: u8) -> WizardView {
        let draft = self.drafts.get(user_id).await.unwrap_or_default();
        self.render(&draft, hour)
    }

    /// Applies a selection and re-renders. On error the draft is unchanged.
    pub async fn select(
        &self,
        user_id: &str,
        selection: Selection,
        hour: u8,
    ) -> Result<WizardView> {
        let field = selection.field();
        let draft = self
            .drafts
            .update(user_id, |draft| apply_selection(draft, selection, &self.rotation, hour))
            .await?;
        debug!(
            "User {} set {} ({:?})",
            user_id,
            field.label(),
            WizardStep::of(&draft)
        );
        Ok(self.render(&draft, hour))
    }

    /// Discards the user's draft. Returns whether one existed.
    pub async fn cancel(&self, user_id: &str) -> bool {
        self.drafts.remove(user_id).await.is_some()
    }

    /// Validates the draft for confirmation without consuming it.
    ///
    /// Fails with `IncompleteSelection` when required fields are missing and with
    /// `Unavailable` when the chosen pair has rotated out since it was picked.
    pub async fn completed_params(&self, user_id: &str, hour: u8) -> Result<LfgParams> {
        let draft = self.drafts.get(user_id).await.unwrap_or_default();
        let params = draft.to_params()?;
        if !self.rotation.is_available(params.map, params.difficulty, hour) {
            return Err(Error::Unavailable {
                map: params.map.label(),
                difficulty: params.difficulty.label(),
                hour,
            });
        }
        Ok(params)
    }

    /// Drops the draft after the request was committed.
    pub async fn finish(&self, user_id: &str) {
        self.drafts.remove(user_id).await;
    }

    /// Renders a draft as the appropriate wizard step.
    #[must_use]
    pub fn render(&self, draft: &SelectionDraft, hour: u8) -> WizardView {
        let step = WizardStep::of(draft);
        if step.in_step2() {
            self.render_step2(draft, step)
        } else {
            self.render_step1(draft, step, hour)
        }
    }

    fn render_step1(&self, draft: &SelectionDraft, step: WizardStep, hour: u8) -> WizardView {
        let mut content = String::from(
            "**Create LFG Request (Step 1 of 2)**\nSelect a map, difficulty and ranked status.",
        );
        let mut menus = Vec::with_capacity(3);

        let maps = self.rotation.available_maps(draft.difficulty, hour);
        match menu(WizardField::Map, &maps, draft.map.as_slice(), 1) {
            Some(view) => menus.push(view),
            None => content.push_str("\n⚠️ No maps are in rotation for this difficulty right now."),
        }

        let difficulties = self.rotation.available_difficulties(draft.map, hour);
        match menu(WizardField::Difficulty, &difficulties, draft.difficulty.as_slice(), 1) {
            Some(view) => menus.push(view),
            None => {
                content.push_str("\n⚠️ No difficulties are in rotation for this map right now.");
            }
        }

        menus.extend(menu(
            WizardField::RankedStatus,
            RankedStatus::ALL,
            draft.ranked_status.as_slice(),
            1,
        ));

        WizardView {
            step,
            content,
            menus,
            confirm_ready: false,
        }
    }

    fn render_step2(&self, draft: &SelectionDraft, step: WizardStep) -> WizardView {
        let mut content = String::from(
            "**Create LFG Request (Step 2 of 2)**\n\
             Select an objective and a loadout. Needed classes are optional.\n",
        );
        content.push_str(&selections_summary(draft));

        let confirm_ready = step == WizardStep::ConfirmReady;
        if confirm_ready {
            content.push_str("\n✅ Ready! Press **Confirm** to post your request.");
        }

        let mut menus = Vec::with_capacity(3);
        menus.extend(menu(
            WizardField::ObjectiveType,
            ObjectiveType::ALL,
            draft.objective_type.as_slice(),
            1,
        ));
        menus.extend(menu(
            WizardField::LoadoutType,
            LoadoutType::ALL,
            draft.loadout_type.as_slice(),
            1,
        ));
        menus.extend(menu(
            WizardField::NeededClasses,
            ClassTag::ALL,
            &draft.needed_classes,
            MAX_NEEDED_CLASSES,
        )
        .map(|mut view| {
            view.min_values = 0;
            view
        }));

        WizardView {
            step,
            content,
            menus,
            confirm_ready,
        }
    }
}

fn label_or_unset<T: Choice>(choice: Option<T>) -> &'static str {
    choice.map_or("Not selected", |choice| choice.label())
}

/// Every answer in the draft, one line per field.
fn selections_summary(draft: &SelectionDraft) -> String {
    let classes = if draft.needed_classes.is_empty() {
        "None".to_string()
    } else {
        draft
            .needed_classes
            .iter()
            .map(|class| class.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut summary = String::from("Current selections:");
    let _ = write!(
        summary,
        "\n- Map: {}\n- Difficulty: {}\n- Ranked Status: {}\
         \n- Objective Type: {}\n- Loadout Type: {}\n- Needed Classes: {classes}",
        label_or_unset(draft.map),
        label_or_unset(draft.difficulty),
        label_or_unset(draft.ranked_status),
        label_or_unset(draft.objective_type),
        label_or_unset(draft.loadout_type),
    );
    summary
}

fn menu<T: Choice>(
    field: WizardField,
    choices: &[T],
    selected: &[T],
    max: usize,
) -> Option<MenuView> {
    if choices.is_empty() {
        return None;
    }
    let options = choices
        .iter()
        .map(|choice| MenuOption {
            label: choice.label(),
            value: choice.label(),
            selected: selected.contains(choice),
        })
        .collect::<Vec<_>>();
    let max_values = u8::try_from(max.min(options.len())).unwrap_or(1);
    Some(MenuView {
        field,
        placeholder: field.placeholder(),
        options,
        min_values: 1,
        max_values,
    })
}

/// Applies one selection to a draft.
///
/// Choosing a map or difficulty that cannot be played with anything at `hour` is
/// rejected. Choosing one that is incompatible with the other step-1 field clears that
/// field so the user picks it again from the narrowed menu. Step-2 fields are refused
/// until step 1 is complete.
pub fn apply_selection(
    draft: &mut SelectionDraft,
    selection: Selection,
    rotation: &RotationTable,
    hour: u8,
) -> Result<()> {
    match selection {
        Selection::Map(map) => {
            if rotation.available_difficulties(Some(map), hour).is_empty() {
                return Err(Error::Unavailable {
                    map: map.label(),
                    difficulty: draft.difficulty.map_or("any difficulty", Difficulty::label),
                    hour,
                });
            }
            if draft
                .difficulty
                .is_some_and(|difficulty| !rotation.is_available(map, difficulty, hour))
            {
                draft.difficulty = None;
            }
            draft.map = Some(map);
        }
        Selection::Difficulty(difficulty) => {
            if rotation.available_maps(Some(difficulty), hour).is_empty() {
                return Err(Error::Unavailable {
                    map: draft.map.map_or("any map", GameMap::label),
                    difficulty: difficulty.label(),
                    hour,
                });
            }
            if draft
                .map
                .is_some_and(|map| !rotation.is_available(map, difficulty, hour))
            {
                draft.map = None;
            }
            draft.difficulty = Some(difficulty);
        }
        Selection::RankedStatus(ranked) => draft.ranked_status = Some(ranked),
        step2 => {
            if !draft.step1_complete() {
                return Err(Error::InvalidSelection {
                    message: "Please finish choosing map, difficulty and ranked status first."
                        .to_string(),
                });
            }
            match step2 {
                Selection::ObjectiveType(objective) => draft.objective_type = Some(objective),
                Selection::LoadoutType(loadout) => draft.loadout_type = Some(loadout),
                Selection::NeededClasses(classes) => draft.needed_classes = classes,
                Selection::Map(_) | Selection::Difficulty(_) | Selection::RankedStatus(_) => {}
            }
        }
    }
    Ok(())
}
