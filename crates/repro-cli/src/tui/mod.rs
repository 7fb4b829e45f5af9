//! Interactive terminal UI
//!
//! A live-query view over the items table:
//! - a: Add an item with a generated value
//! - c: Clear all items
//! - q: Quit
//!
//! When a sync service is configured the diagnostic sequence runs once on
//! startup and its result is shown in the status bar. The list itself is
//! driven by the live query, so remote changes appear as they are applied.

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use repro_core::{Config, Connection, LiveMany};

use app::App;
use crate::commands::run::VISIBILITY_DELAY_MS;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    let mut conn = Connection::connect(config).await?;

    // File-based logging, only if REPRO_LOG is set
    init_tui_logging(conn.config());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new();
    app.items = conn.find_many().await?;

    if conn.config().service_url.is_some() {
        app.set_status("Syncing...".to_string());
        terminal.draw(|frame| ui::draw(frame, &app))?;

        match startup_sync(&mut conn).await {
            Ok(summary) => app.set_status(summary),
            Err(e) => app.set_status(format!("Sync failed: {}", e)),
        }
        app.items = conn.find_many().await?;
    } else {
        app.set_status("Sync service not configured; local data only".to_string());
    }

    let live = conn.live_many();
    let result = run_app(&mut terminal, &mut app, &conn, live).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    conn.close().await?;
    result
}

/// Run the diagnostic sequence once and summarize the counts it observed
async fn startup_sync(conn: &mut Connection) -> Result<String> {
    let mut shape = conn.sync_items().await?;
    shape.synced().await?;

    let immediate = conn.find_many().await?.len();
    tokio::time::sleep(Duration::from_millis(VISIBILITY_DELAY_MS)).await;
    let delayed = conn.find_many().await?.len();

    Ok(format!(
        "Synced: {} item(s) visible at once, {} after {} ms",
        immediate, delayed, VISIBILITY_DELAY_MS
    ))
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    conn: &Connection,
    mut live: LiveMany,
) -> Result<()> {
    loop {
        app.check_status_timeout();

        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            // Refresh the list whenever the live query reports a change
            items = live.next() => {
                if let Ok(items) = items {
                    app.items = items;
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                                app.should_quit = true;
                            }
                            KeyCode::Char('a') => {
                                let item = conn.create().await?;
                                app.set_status(format!("Added {}", item.value));
                            }
                            KeyCode::Char('c') => {
                                let deleted = conn.delete_many().await?;
                                app.set_status(format!("Cleared {} item(s)", deleted));
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn init_tui_logging(config: &Config) {
    // Only log if REPRO_LOG is set
    let Ok(log_level) = std::env::var("REPRO_LOG") else {
        return;
    };

    let log_path = config.data_dir.join("debug.log");

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!("repro_core={},repro={}", log_level, log_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
