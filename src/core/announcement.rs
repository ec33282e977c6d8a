//! Announcement rendering - What the public LFG post and voice channel look like.
//!
//! Pure functions from a request record to view models. The post has three visual
//! states: open (green, join enabled), full (red, ping struck through, join disabled)
//! and closed (grey, no buttons).

use crate::entities::{Choice, lfg_request};
use std::fmt::Write as _;

const COLOR_OPEN: u32 = 0x00FF00;
const COLOR_FULL: u32 = 0xFF0000;
const COLOR_CLOSED: u32 = 0x808080;

/// Visual state of an announcement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnouncementState {
    /// Accepting members
    Open,
    /// At capacity
    Full,
    /// Closed by the owner
    Closed,
}

impl AnnouncementState {
    /// State for a request record
    #[must_use]
    pub fn of(request: &lfg_request::Model) -> Self {
        if !request.is_active() {
            Self::Closed
        } else if request.is_full() {
            Self::Full
        } else {
            Self::Open
        }
    }
}

/// Announcement button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SquadAction {
    /// Join the squad
    Join,
    /// Leave the squad
    Leave,
}

/// A rendered announcement button
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonView {
    /// What the button does
    pub action: SquadAction,
    /// Button text
    pub label: &'static str,
    /// Greyed out
    pub disabled: bool,
}

/// An embed field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldView {
    /// Field name
    pub name: String,
    /// Field value
    pub value: String,
    /// Render inline
    pub inline: bool,
}

/// A rendered embed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedView {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Accent color (RGB)
    pub color: u32,
    /// Fields in display order
    pub fields: Vec<FieldView>,
    /// Footer text
    pub footer: String,
}

/// A rendered announcement message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnouncementView {
    /// Request the announcement belongs to
    pub request_id: String,
    /// Visual state
    pub state: AnnouncementState,
    /// Message text above the embed (carries the ping)
    pub content: String,
    /// The embed
    pub embed: EmbedView,
    /// Buttons; empty once closed
    pub buttons: Vec<ButtonView>,
}

/// The mention placed at the top of an announcement.
#[must_use]
pub fn ping_banner(ping_role_id: Option<&str>) -> String {
    ping_role_id.map_or_else(|| "@everyone".to_string(), |role| format!("<@&{role}>"))
}

/// `LF2`, `LF1`, or `LF?` when no slots remain.
fn looking_for(request: &lfg_request::Model) -> String {
    match request.open_slots() {
        0 => "LF?".to_string(),
        open => format!("LF{open}"),
    }
}

/// Deterministic voice channel name, e.g. `🎮 Zero-Dam-Easy-LF2`.
#[must_use]
pub fn voice_channel_name(request: &lfg_request::Model) -> String {
    let map = request
        .map
        .label()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!(
        "🎮 {}-{}-{}",
        map,
        request.difficulty.label(),
        looking_for(request)
    )
}

fn member_list(request: &lfg_request::Model) -> String {
    let mut list = String::new();
    for member in &request.members.0 {
        if !list.is_empty() {
            list.push('\n');
        }
        let _ = write!(list, "<@{}>", member.id);
        if member.id == request.owner_id {
            list.push_str(" (Owner)");
        }
    }
    if list.is_empty() {
        list.push_str("None");
    }
    list
}

fn fields(request: &lfg_request::Model) -> Vec<FieldView> {
    let field = |name: &str, value: String, inline: bool| FieldView {
        name: name.to_string(),
        value,
        inline,
    };
    let classes = if request.needed_classes.0.is_empty() {
        "None specified".to_string()
    } else {
        request
            .needed_classes
            .0
            .iter()
            .map(|class| class.label())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let voice = request
        .voice_channel_id
        .as_ref()
        .map_or_else(|| "None".to_string(), |id| format!("<#{id}>"));

    vec![
        field("Mode", request.mode.clone(), true),
        field("Map", request.map.label().to_string(), true),
        field("Difficulty", request.difficulty.label().to_string(), true),
        field("Ranked Status", request.ranked_status.label().to_string(), true),
        field("Objective Type", request.objective_type.label().to_string(), true),
        field("Loadout Type", request.loadout_type.label().to_string(), true),
        field("Needed Classes", classes, false),
        field("Voice Channel", voice, false),
        field(
            &format!(
                "Squad Members ({}/{})",
                request.members.len(),
                request.squad_size
            ),
            member_list(request),
            false,
        ),
    ]
}

/// Renders the announcement for the request's current state.
#[must_use]
pub fn render_announcement(
    request: &lfg_request::Model,
    ping_role_id: Option<&str>,
) -> AnnouncementView {
    let state = AnnouncementState::of(request);
    let ping = ping_banner(ping_role_id);
    let map = request.map.label();
    let difficulty = request.difficulty.label();

    let (content, title, color) = match state {
        AnnouncementState::Open => (
            format!("{ping} New LFG request!"),
            format!("{} for {map} ({difficulty})", looking_for(request)),
            COLOR_OPEN,
        ),
        AnnouncementState::Full => (
            format!("~~{ping} New LFG request!~~\n**This squad is now full!**"),
            format!("Squad Full: {map} ({difficulty})"),
            COLOR_FULL,
        ),
        AnnouncementState::Closed => (
            format!(
                "~~{ping} LFG Request~~\n**This LFG request has been closed by the owner.**"
            ),
            format!("CLOSED: {map} ({difficulty})"),
            COLOR_CLOSED,
        ),
    };

    let buttons = match state {
        AnnouncementState::Closed => Vec::new(),
        open_or_full => vec![
            ButtonView {
                action: SquadAction::Join,
                label: "Join Squad",
                disabled: open_or_full == AnnouncementState::Full,
            },
            ButtonView {
                action: SquadAction::Leave,
                label: "Leave Squad",
                disabled: false,
            },
        ],
    };

    let description = format!(
        "<@{}> is looking for teammates! Posted <t:{}:R>\n🎤 Microphone required",
        request.owner_id,
        request.created_at.timestamp()
    );

    AnnouncementView {
        request_id: request.id.clone(),
        state,
        content,
        embed: EmbedView {
            title,
            description,
            color,
            fields: fields(request),
            footer: format!("Squad ID: {}", request.id),
        },
        buttons,
    }
}
