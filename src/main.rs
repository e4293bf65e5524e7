use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod api;
mod app;
mod config;
mod handler;
mod logging;
mod tui;
mod ui;

use api::CockpitClient;
use app::App;
use config::Config;

#[derive(Parser)]
#[command(name = "agentdeck")]
#[command(about = "Terminal client for an agent orchestration backend", version)]
struct Cli {
    /// Backend base URL (overrides AGENTDECK_URL and the config file)
    #[arg(long)]
    url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.log_dir.clone(), cli.verbose)?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "failed to load config, using defaults");
        Config::new()
    });
    let base_url = config.resolve_backend_url(cli.url);
    tracing::info!(%base_url, "starting agentdeck");

    let client = CockpitClient::new(&base_url);
    let mut app = App::new(client);
    app.refresh_all();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut tui::EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        // Apply any finished fetch/chat tasks before the next frame
        app.poll_background().await;
    }
    Ok(())
}
