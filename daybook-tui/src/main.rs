use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event};

use daybook::api::{ApiClient, ApiError};
use daybook::app::{App, Screen};
use daybook::config::ConfigManager;
use daybook::logging::{self, LogConfig};
use daybook::watchdog::{LoadError, LoadingWatchdog};
use daybook::{terminal, ui};

/// Daybook - share what you're doing with yourself, your friends and the world
#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "A keyboard-driven terminal client for sharing your day")]
#[command(version)]
struct Cli {
    /// Server URL to connect to
    #[arg(long, short, env = "DAYBOOK_SERVER_URL")]
    server: Option<String>,

    /// Email to prefill on the login screen
    #[arg(long, short, env = "DAYBOOK_EMAIL")]
    email: Option<String>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Seconds the initial load may take before it is restarted
    #[arg(long, env = "DAYBOOK_LOAD_TIMEOUT", default_value_t = 10)]
    load_timeout: u64,

    /// How many times a hung initial load is restarted before giving up
    #[arg(long, default_value_t = 3)]
    max_reloads: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // DAYBOOK_SERVER_URL and friends may come from a .env file
    let _ = dotenv::dotenv();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    logging::init_logging(&log_config)?;

    let config_manager = match ConfigManager::new() {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Running without saved sessions: {}", e);
            None
        }
    };
    let server_url = match &config_manager {
        Some(config) => config.determine_server_url(cli.server.as_deref()),
        None => cli
            .server
            .clone()
            .unwrap_or_else(|| daybook::config::DEFAULT_SERVER_URL.to_string()),
    };
    log::info!("Using server {}", server_url);

    let mut tui = terminal::init()?;

    let new_app = |config_manager: &Option<ConfigManager>, log_config: &LogConfig| {
        let mut app = App::new(Arc::new(ApiClient::new(server_url.clone())))
            .with_log_config(log_config.clone());
        if let Some(config) = config_manager {
            app = app.with_config_manager(config.clone());
        }
        app
    };

    // Each attempt starts from a fresh client, so a hung request dies with its attempt
    let watchdog = LoadingWatchdog::new(Duration::from_secs(cli.load_timeout), cli.max_reloads);
    let loaded = watchdog
        .run(|attempt| {
            if let Err(e) = tui.draw(|frame| ui::render_loading(frame, attempt)) {
                log::warn!("Failed to draw loading screen: {}", e);
            }
            let mut app = new_app(&config_manager, &log_config);
            async move {
                app.initialize().await?;
                Ok::<_, ApiError>(app)
            }
        })
        .await;

    let mut app = match loaded {
        Ok(app) => app,
        Err(e) => {
            log::error!("Initial load failed: {}", e);
            let mut app = new_app(&config_manager, &log_config);
            app.screen = Screen::Auth;
            app.auth.error = Some(match e {
                LoadError::TimedOut { .. } => {
                    "The server is not responding. Check your connection and try again.".to_string()
                }
                LoadError::Failed(e) => daybook::app::categorize_api_error(&e),
            });
            app
        }
    };
    if app.auth.email.is_empty() {
        if let Some(email) = cli.email {
            app.auth.email = email;
        }
    }

    let result = run(&mut tui, &mut app).await;
    terminal::restore()?;
    result
}

async fn run(tui: &mut terminal::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.process_completions();
        app.clear_expired_notice(Instant::now());

        tui.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = app.handle_key_event(key) {
                    if let Err(e) = app.perform(action).await {
                        log::error!("{:?} failed: {}", action, e);
                    }
                }
            }
        }
    }
    Ok(())
}
