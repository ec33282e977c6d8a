//! Serenity builders for the views rendered by `core`.
//!
//! The core layer decides what a message says; this module only decides how that looks
//! as Discord components.

use crate::{
    bot::handlers::custom_id::LfgComponent,
    core::{
        announcement::{AnnouncementView, EmbedView, SquadAction},
        wizard::{MenuView, WizardView},
    },
    entities::{Choice, lfg_request},
};
use poise::serenity_prelude as serenity;
use serenity::{
    ButtonStyle, CreateActionRow, CreateAllowedMentions, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateMessage, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption, EditMessage,
};

fn select_menu(menu: &MenuView) -> CreateSelectMenu {
    let options = menu
        .options
        .iter()
        .map(|option| {
            CreateSelectMenuOption::new(option.label, option.value)
                .default_selection(option.selected)
        })
        .collect();

    CreateSelectMenu::new(
        LfgComponent::Select(menu.field).custom_id(),
        CreateSelectMenuKind::String { options },
    )
    .placeholder(menu.placeholder)
    .min_values(menu.min_values)
    .max_values(menu.max_values)
}

/// One row per menu, then the confirm/cancel row.
#[must_use]
pub fn wizard_components(view: &WizardView) -> Vec<CreateActionRow> {
    let mut rows: Vec<CreateActionRow> = view
        .menus
        .iter()
        .map(|menu| CreateActionRow::SelectMenu(select_menu(menu)))
        .collect();

    rows.push(CreateActionRow::Buttons(vec![
        CreateButton::new(LfgComponent::CreateConfirm.custom_id())
            .label("Confirm")
            .style(ButtonStyle::Success)
            .disabled(!view.confirm_ready),
        CreateButton::new(LfgComponent::CreateCancel.custom_id())
            .label("Cancel")
            .style(ButtonStyle::Secondary),
    ]));
    rows
}

/// Buttons offered when `/lfg create` finds an active request.
#[must_use]
pub fn existing_request_components(request_id: &str) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(LfgComponent::CloseExisting(request_id.to_string()).custom_id())
            .label("Close Existing LFG")
            .style(ButtonStyle::Danger),
        CreateButton::new(LfgComponent::CancelCreation.custom_id())
            .label("Keep It")
            .style(ButtonStyle::Secondary),
    ])]
}

/// Confirm/cancel buttons for closing a request.
#[must_use]
pub fn close_prompt_components(request_id: &str) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(LfgComponent::CloseConfirm(request_id.to_string()).custom_id())
            .label("Close LFG")
            .style(ButtonStyle::Danger),
        CreateButton::new(LfgComponent::CloseCancel.custom_id())
            .label("Cancel")
            .style(ButtonStyle::Secondary),
    ])]
}

fn embed(view: &EmbedView) -> CreateEmbed {
    CreateEmbed::new()
        .title(&view.title)
        .description(&view.description)
        .color(view.color)
        .fields(
            view.fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone(), field.inline)),
        )
        .footer(CreateEmbedFooter::new(&view.footer))
}

fn announcement_components(view: &AnnouncementView) -> Vec<CreateActionRow> {
    if view.buttons.is_empty() {
        return Vec::new();
    }

    let buttons = view
        .buttons
        .iter()
        .map(|button| {
            let (component, style) = match button.action {
                SquadAction::Join => (
                    LfgComponent::Join(view.request_id.clone()),
                    ButtonStyle::Success,
                ),
                SquadAction::Leave => (
                    LfgComponent::Leave(view.request_id.clone()),
                    ButtonStyle::Danger,
                ),
            };
            CreateButton::new(component.custom_id())
                .label(button.label)
                .style(style)
                .disabled(button.disabled)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

fn announcement_mentions() -> CreateAllowedMentions {
    CreateAllowedMentions::new().everyone(true).all_roles(true)
}

/// A new announcement message.
#[must_use]
pub fn create_announcement(view: &AnnouncementView) -> CreateMessage {
    CreateMessage::new()
        .content(&view.content)
        .embed(embed(&view.embed))
        .components(announcement_components(view))
        .allowed_mentions(announcement_mentions())
}

/// An edit replacing every part of an announcement. A closed announcement loses its
/// buttons.
#[must_use]
pub fn edit_announcement(view: &AnnouncementView) -> EditMessage {
    EditMessage::new()
        .content(&view.content)
        .embed(embed(&view.embed))
        .components(announcement_components(view))
        .allowed_mentions(announcement_mentions())
}

/// One line per active request for `/lfg list`.
#[must_use]
pub fn request_summary(request: &lfg_request::Model) -> String {
    let voice = request
        .voice_channel_id
        .as_deref()
        .map_or_else(String::new, |id| format!(" • <#{id}>"));
    format!(
        "**{} ({})** by <@{}> • {}/{} • {} • {}{voice}",
        request.map.label(),
        request.difficulty.label(),
        request.owner_id,
        request.members.len(),
        request.squad_size,
        request.ranked_status.label(),
        request.objective_type.label(),
    )
}

/// Discord's limit on an embed description, in characters.
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Joins request summaries into one embed description. Lines that would push it past
/// Discord's limit are left out and counted in a trailer instead.
#[must_use]
pub fn request_list_description(summaries: &[String]) -> String {
    let mut description = String::new();
    let mut length = 0;
    for (shown, summary) in summaries.iter().enumerate() {
        let remaining = summaries.len() - shown;
        let separator = usize::from(shown > 0);
        let mut needed = length + separator + summary.chars().count();
        if remaining > 1 {
            // Room to say how many were cut
            needed += format!("\n…and {} more", remaining - 1).chars().count();
        }
        if separator == 1 {
            description.push('\n');
        }
        if needed > EMBED_DESCRIPTION_LIMIT {
            description.push_str(&format!("…and {remaining} more"));
            return description;
        }
        description.push_str(summary);
        length += separator + summary.chars().count();
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        announcement::render_announcement, rotation::RotationTable, wizard::WizardController,
    };
    use crate::entities::{SquadMember, lfg_request};
    use crate::test_utils::sample_request;
    use chrono::Utc;

    #[test]
    fn test_wizard_rows_fit_discord_limit() {
        let controller = WizardController::new(RotationTable::builtin());
        let view = controller.render(&Default::default(), 5);
        let rows = wizard_components(&view);
        assert_eq!(rows.len(), view.menus.len() + 1);
        assert!(rows.len() <= 5);
    }

    #[test]
    fn test_closed_announcement_has_no_buttons() {
        let mut request = sample_request("r1", "g1", "owner");
        request.status = crate::entities::LfgStatus::Closed;
        request.closed_at = Some(Utc::now());
        let view = render_announcement(&request, None);
        assert!(announcement_components(&view).is_empty());
    }

    #[test]
    fn test_open_announcement_has_button_row() {
        let request = sample_request("r1", "g1", "owner");
        let view = render_announcement(&request, None);
        assert_eq!(announcement_components(&view).len(), 1);
    }

    #[test]
    fn test_request_list_description_fits_embed() {
        let short = vec!["a".to_string(), "b".to_string()];
        assert_eq!(request_list_description(&short), "a\nb");

        let summaries: Vec<String> = (0..60)
            .map(|n| format!("{n:02}{}", "x".repeat(98)))
            .collect();
        let description = request_list_description(&summaries);
        assert!(description.chars().count() <= EMBED_DESCRIPTION_LIMIT);

        // 40 lines of 100 plus separators fit, the other 20 are counted
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(lines.len(), 41);
        assert!(lines[39].starts_with("39"));
        assert_eq!(lines[40], "…and 20 more");
    }

    #[test]
    fn test_request_summary() {
        let mut request: lfg_request::Model = sample_request("r1", "g1", "owner");
        request.members.0.push(SquadMember {
            id: "friend".to_string(),
            tag: "friend#0002".to_string(),
            joined_at: Utc::now(),
        });
        request.voice_channel_id = Some("vc1".to_string());

        assert_eq!(
            request_summary(&request),
            "**Zero Dam (Easy)** by <@owner> • 2/3 • Ranked • Hotspots • <#vc1>"
        );
    }
}
