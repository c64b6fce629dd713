mod app;
mod gallery;
mod handlers;

use std::{error::Error, fs::File, io, sync::Arc, time::Duration};

use app::App;
use crossterm::{
    cursor,
    event::{self, Event as CEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nexus_avatar::{global_prefs, AvatarEvent};
use ratatui::{backend::CrosstermBackend, Terminal};
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application events
enum AppEvent {
    Terminal(CEvent),
    Avatar(AvatarEvent),
    Tick,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    global_prefs::init_global_prefs();
    let (tooltip_style, avatar_size, log_path) = {
        let prefs = global_prefs::global_prefs();
        (prefs.tooltip_style, prefs.avatar_size, prefs.log_path())
    };

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = File::create(&log_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    info!(log = %log_path.display(), "starting avatar gallery");

    // Query before raw mode and the alternate screen take over stdout.
    let picker = Picker::from_query_stdio().unwrap_or_else(|e| {
        warn!(error = %e, "failed to query terminal for graphics support, using half blocks");
        Picker::from_fontsize((8, 16))
    });

    let _terminal_guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    // Avatar notifications and terminal events share one loop
    let (avatar_tx, mut avatar_rx) = mpsc::unbounded_channel::<AvatarEvent>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let mut app = App::new(avatar_tx, tooltip_style, avatar_size, picker);

    // Spawn terminal event handler
    let event_tx_clone = event_tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(50));
        loop {
            interval.tick().await;

            // Check for terminal events (non-blocking)
            if event::poll(Duration::from_millis(0)).unwrap_or(false) {
                if let Ok(event) = event::read() {
                    if event_tx_clone.send(AppEvent::Terminal(event)).is_err() {
                        break;
                    }
                }
            }

            if event_tx_clone.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    // Forward avatar notifications
    let event_tx_clone = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = avatar_rx.recv().await {
            if event_tx_clone.send(AppEvent::Avatar(event)).is_err() {
                break;
            }
        }
    });

    // Main application loop
    while !app.should_quit {
        terminal.draw(|f| gallery::ui(f, &mut app))?;

        if let Some(event) = event_rx.recv().await {
            match event {
                AppEvent::Terminal(CEvent::Key(key)) => handlers::handle_key_event(key, &mut app),
                AppEvent::Terminal(_) | AppEvent::Tick => {}
                AppEvent::Avatar(event) => app.handle_avatar_event(event),
            }
        }
    }

    {
        let mut prefs = global_prefs::global_prefs_mut();
        prefs.tooltip_style = app.tooltip_style;
        prefs.save();
    }

    Ok(())
}

/// Puts the terminal in raw mode on the alternate screen and restores it on drop,
/// including when `main` bails out early with `?`.
struct TerminalGuard {
    restore: fn() -> io::Result<()>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard { restore: restore_terminal };
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = (self.restore)() {
            warn!(error = %e, "failed to restore terminal");
        }
    }
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}
