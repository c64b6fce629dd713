use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Main input handler dispatcher
pub fn handle_key_event(key: KeyEvent, app: &mut App) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.should_quit = true,
        KeyCode::Right | KeyCode::Tab => app.select_next(),
        KeyCode::Left | KeyCode::BackTab => app.select_previous(),
        KeyCode::Char('t') => app.cycle_tooltip_style(),
        KeyCode::Char('r') => app.remount_selected(),
        KeyCode::Char('u') => app.unmount_selected(),
        _ => {}
    }
}
