//! recipebox - a terminal client for sharing recipes.
//!
//! This application provides a fast, keyboard-driven interface for browsing,
//! adding, editing and deleting recipes on a recipe service.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use recipebox_core::config::{Config, ENV_PASSWORD};
use recipebox_core::recipes::filter_recipes;

use app::{build_services, App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "recipebox.log";

const USAGE: &str = "\
Usage: recipebox [COMMAND]

With no command, starts the terminal UI.

Commands:
  --login          Log in and store the session token
  --logout         Log out and forget the session token
  --whoami         Show the logged-in user
  --list [TERM]    Print recipes (optionally filtered) as JSON
  --help           Show this message";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a daily rolling file so they never draw over the TUI. The
/// returned guard must be held until exit to flush buffered lines.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    std::fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (mut config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_env();

    let log_dir = config.cache_dir()?.join("logs");
    let _guard = init_tracing(&log_dir)?;
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {}
        Some("--login") => return login_command(config).await,
        Some("--logout") => return logout_command(&config).await,
        Some("--whoami") => return whoami_command(&config).await,
        Some("--list") => return list_command(&config, args.get(2).map(String::as_str)).await,
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown argument: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    info!(api = %config.api_base_url, "recipebox starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("recipebox shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // Show the loading frame while the stored session is revalidated
    terminal.draw(|f| render(f, app))?;
    app.initialize().await;

    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// One-shot commands
// ============================================================================

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(d) if input.is_empty() => d.to_string(),
        _ => input.to_string(),
    })
}

/// Interactive login
async fn login_command(mut config: Config) -> Result<()> {
    let (mut auth, _) = build_services(&config)?;

    let default_email = config.login_email();
    let email = prompt("Email", default_email.as_deref())?;
    if email.is_empty() {
        anyhow::bail!("An email address is required");
    }

    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    println!("\nAuthenticating...");
    let user = auth
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if let Err(e) = config.remember_email(&email) {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {} <{}>", user.display_name(), user.email);
    Ok(())
}

async fn logout_command(config: &Config) -> Result<()> {
    let (mut auth, _) = build_services(config)?;
    auth.logout().await;
    println!("Logged out");
    Ok(())
}

async fn whoami_command(config: &Config) -> Result<()> {
    let (mut auth, _) = build_services(config)?;
    match auth.check_session().await.user() {
        Some(user) => println!("{} <{}>", user.display_name(), user.email),
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Print recipes as JSON, optionally filtered by title or type
async fn list_command(config: &Config, term: Option<&str>) -> Result<()> {
    let (mut auth, repository) = build_services(config)?;
    auth.check_session().await;

    let recipes = repository
        .with_client(auth.authorized_client())
        .list()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let matching = filter_recipes(&recipes, term.unwrap_or(""));
    eprintln!("{} of {} recipes", matching.len(), recipes.len());

    let json = serde_json::to_string_pretty(&matching)?;
    println!("{}", json);
    Ok(())
}
