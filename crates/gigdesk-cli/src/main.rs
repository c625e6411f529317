//! gigdesk - command-line host for the marketplace session client.
//!
//! Drives login, logout, token refresh, and authenticated requests from
//! the terminal, keeping the session token in the configured store.

mod commands;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use gigdesk_core::{ApiConfig, Config, FileStorage, KeyringStorage, SessionManager, TokenStorage};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;

/// Selects the token store: `file` (default) or `keyring`
const TOKEN_STORE_ENV: &str = "GIGDESK_TOKEN_STORE";

/// When set, logs are also written to this file
const LOG_FILE_ENV: &str = "GIGDESK_LOG_FILE";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer on drop.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "gigdesk.log".into());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn open_storage() -> Result<Arc<dyn TokenStorage>> {
    let kind = std::env::var(TOKEN_STORE_ENV).unwrap_or_else(|_| "file".to_string());
    match kind.trim().to_ascii_lowercase().as_str() {
        "keyring" => Ok(Arc::new(KeyringStorage::new())),
        "file" | "" => {
            let dir = Config::storage_dir()?;
            debug!(dir = %dir.display(), "Using file token storage");
            Ok(Arc::new(FileStorage::new(dir)))
        }
        other => anyhow::bail!("Unknown {} value '{}' (expected 'file' or 'keyring')", TOKEN_STORE_ENV, other),
    }
}

fn print_usage() {
    eprintln!("Usage: gigdesk <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login [email]            Sign in and store the session token");
    eprintln!("  logout                   End the session");
    eprintln!("  status                   Show the current session state");
    eprintln!("  refresh                  Exchange the token for a fresh one");
    eprintln!("  users [--page N] [--limit N]");
    eprintln!("                           List users");
    eprintln!("  user <id>                Show one user");
    eprintln!("  gate <path>              Show the access decision for a route");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(2);
        }
    };
    if matches!(command, Command::Help) {
        print_usage();
        return Ok(());
    }

    let mut config = Config::load().context("Failed to load config")?;
    let api = ApiConfig::resolve(&config);

    let storage = open_storage()?;
    let session = SessionManager::connect(api, storage).context("Failed to build API client")?;
    info!(
        base_url = session.client().base_url(),
        timeout_ms = session.client().timeout().as_millis() as u64,
        "gigdesk starting"
    );

    commands::run(command, &session, &mut config).await
}
