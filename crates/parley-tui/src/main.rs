//! Parley TUI entry point.

use std::{
    fs::OpenOptions,
    io::{Write, stdout},
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::{Parser, Subcommand};
use parley_client::ClientConfig;
use parley_tui::{
    App, AppEvent, KeyInput, NotificationMode, Runtime, SystemEnv, TerminalDriver, init_env,
};
use tracing_subscriber::EnvFilter;

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley-tui")]
#[command(about = "Terminal client for Parley chat rooms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Relay WebSocket endpoint
    #[arg(short, long, env = "PARLEY_SERVER_URL", default_value = "ws://127.0.0.1:3001/ws")]
    server: String,

    /// Display name to pre-fill on the join screen
    #[arg(short, long, env = "PARLEY_USERNAME")]
    username: Option<String>,

    /// Join immediately with --username
    #[arg(long, requires = "username")]
    auto_join: bool,

    /// Whether new messages may ring the terminal bell
    #[arg(long, env = "PARLEY_NOTIFICATIONS", value_enum, default_value_t)]
    notifications: NotificationMode,

    /// Write logs here (filtered by PARLEY_LOG, default "info")
    #[arg(long, env = "PARLEY_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create `.env` from `.env.example` in each directory, never overwriting
    ///
    /// Every directory is handled even when an earlier one fails, e.g.
    /// `parley-tui init-env server client` bootstraps both checkouts.
    #[command(after_help = "Example: parley-tui init-env server client")]
    InitEnv {
        /// Directories to bootstrap, processed in order (default: current)
        #[arg(default_value = ".", value_name = "DIR", num_args = 1..)]
        dirs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    if let Some(Command::InitEnv { dirs }) = &cli.command {
        let mut out = stdout().lock();
        for report in init_env(dirs.as_slice()) {
            writeln!(out, "{report}")?;
        }
        writeln!(out, "Env setup complete. Edit the newly created .env files as needed.")?;
        return Ok(());
    }

    let app = cli.username.as_deref().map_or_else(App::new, App::with_username);

    let mut driver = TerminalDriver::new(cli.server, cli.notifications)?;
    if cli.auto_join {
        driver.queue_input(AppEvent::Key(KeyInput::Enter));
    }

    tracing::info!("parley-tui starting");
    let runtime = Runtime::new(driver, SystemEnv::new(), ClientConfig::default(), app);
    Ok(runtime.run().await?)
}

fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("PARLEY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
