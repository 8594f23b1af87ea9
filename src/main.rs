pub mod agent;
pub mod app;
pub mod config;
pub mod event;
pub mod locale;
pub mod logging;
pub mod session;
pub mod table;
pub mod tui;
pub mod ui;
pub mod upload;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::{Action, App};
use clap::Parser;
use config::Settings;
use crossterm::event::EventStream;
use event::Event;
use futures_util::StreamExt;
use locale::Locale;
use log::{error, info};
use tui::{Tui, init, restore};
use ui::render;

/// Chat with a CSV file from the terminal.
#[derive(Debug, Parser)]
#[command(name = "yancca", version, about)]
struct Cli {
    /// CSV file to load on startup.
    file: Option<PathBuf>,

    /// Directory the file picker scans for CSV files.
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Initial response language.
    #[arg(long, short = 'l')]
    language: Option<Locale>,

    /// Where to write the log; defaults to yancca.log in the temp directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("invalid configuration")?;

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    if let Err(err) = logging::init(&log_path, settings.debug) {
        eprintln!("warning: logging disabled: {:#}", err);
    }
    info!(
        "Starting yancca (model {}, API key {})",
        settings.openai_model,
        if settings.has_api_key() { "loaded" } else { "missing" }
    );

    let mut app = App::new(settings, cli.language.unwrap_or_default(), cli.dir)?;
    if let Some(file) = cli.file {
        app.queue(Action::LoadFile(file));
    }

    let mut tui = init()?;
    let result = run(&mut tui, &mut app).await;
    restore()?;
    if let Err(err) = &result {
        error!("Exiting after error: {:#}", err);
    }
    result
}

/// Draws, then runs at most one queued action, then waits for input when
/// nothing is queued. Drawing first lets "Thinking..." show before a
/// question's request is awaited.
async fn run(tui: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();

    while !app.should_quit {
        tui.draw(|frame| render(frame, app))?;

        if let Some(action) = app.next_action() {
            app.dispatch(action).await;
            continue;
        }

        let event = match stream.next().await {
            Some(Ok(raw)) => match Event::from_crossterm(raw) {
                Some(event) => event,
                None => continue,
            },
            Some(Err(err)) => return Err(err).context("reading terminal events"),
            None => break,
        };
        app.handle_event(event);
    }

    info!("Shutting down");
    Ok(())
}
