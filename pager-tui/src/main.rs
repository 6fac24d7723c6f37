//! Remote pager TUI entry point.

use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pager_tui::config::TuiConfig;
use pager_tui::error::TuiError;
use pager_tui::events::TuiEvent;
use pager_tui::keys::{map_key, Action};
use pager_tui::remote::{build_source, JsonApp};
use pager_tui::state::App;
use pager_tui::{logging, view};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    logging::init(&config.log_path)?;
    tracing::info!(url_template = %config.url_template, page_size = config.page_size, "Starting viewer");

    let mut app: JsonApp = App::new(build_source(&config)?);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let size = terminal.size()?;
    app.set_viewport_height(view::list_height(size.height));

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms));

    loop {
        terminal.draw(|f| view::render(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                app.prune_notifications(chrono::Utc::now());
            }
            Some(events) = app.source.next_completion() => {
                app.apply_events(events);
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    tracing::info!("Viewer stopped");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) => sender.blocking_send(TuiEvent::Input(key)),
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}

/// Returns true when the viewer should exit.
fn handle_event(app: &mut JsonApp, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => match map_key(key) {
            Some(action) => handle_action(app, action),
            None => false,
        },
        TuiEvent::Resize { height, .. } => {
            app.set_viewport_height(view::list_height(height));
            false
        }
    }
}

fn handle_action(app: &mut JsonApp, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::MoveDown => app.select_next(),
        Action::MoveUp => app.select_previous(),
        Action::PageDown => app.page_down(),
        Action::PageUp => app.page_up(),
        Action::Top => app.select_top(),
        Action::Bottom => app.select_bottom(),
        Action::Reset => app.reset(),
        Action::Retry => app.retry(),
    }
    false
}
