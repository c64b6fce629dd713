//! Gallery screen.

use nexus_avatar::ui::draw_avatar;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{gallery_label, App, GALLERY_LEN};

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let chunks = Layout::default()
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Gallery
            Constraint::Length(3), // Footer
        ])
        .split(size);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Avatar gallery", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  tooltip: {:?}", app.tooltip_style)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    draw_gallery(f, app, chunks[1]);

    let footer = Paragraph::new("[←/→] Select | [t] Tooltip style | [r] Remount | [u] Unmount | [q] Quit")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn draw_gallery(f: &mut Frame, app: &mut App, area: Rect) {
    let per_row = (GALLERY_LEN / 2) as u32;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for index in 0..GALLERY_LEN {
        let row = rows[index / per_row as usize];
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, per_row); GALLERY_LEN / 2])
            .split(row);
        let slot_area = columns[index % per_row as usize];

        let selected = index == app.selected;
        let border_style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(gallery_label(index))
            .border_style(border_style);
        let inner = block.inner(slot_area);
        f.render_widget(block, slot_area);
        if inner.width == 0 || inner.height == 0 {
            continue;
        }

        match app.slots[index].as_mut() {
            Some(controller) => draw_avatar(f, inner, controller, &app.picker, selected),
            None => f.render_widget(
                Paragraph::new("(unmounted)").style(Style::default().fg(Color::DarkGray)),
                inner,
            ),
        }
    }
}
