//! Tooltip text for avatars.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::model::TooltipStyle;

/// Text shown when hovering an avatar, `None` when the style disables the tooltip.
pub fn tooltip_text(
    style: TooltipStyle,
    display_name: Option<&str>,
    unique_id: &str,
    unique_name: Option<&str>,
) -> Option<String> {
    match style {
        TooltipStyle::DisplayName => Some(display_name.unwrap_or(unique_id).to_string()),
        TooltipStyle::UniqueId => Some(unique_id.to_string()),
        TooltipStyle::Combined => Some(match display_name {
            Some(name) => format!("{} ({})", name, unique_id),
            None => unique_name.unwrap_or(unique_id).to_string(),
        }),
        TooltipStyle::None => None,
    }
}

/// Draws the tooltip as a one-line label just below `anchor`, clipped to `bounds`.
pub fn draw_tooltip(f: &mut Frame, text: &str, anchor: Rect, bounds: Rect) {
    let y = anchor.y.saturating_add(anchor.height);
    if y >= bounds.y + bounds.height {
        return;
    }
    let width = (text.chars().count() as u16).min(bounds.x + bounds.width - anchor.x);
    if width == 0 {
        return;
    }
    let area = Rect::new(anchor.x, y, width, 1);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text.to_string()).style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        area,
    );
}
