//! # Vastra POS Service Library
//!
//! The service layer behind the counter screen. Every user action is one
//! async command function; state is passed in explicitly.
//!
//! ## Module Organization
//! ```text
//! vastra_pos/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart and session state
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── product.rs  ◄─── Catalog lookup and stock
//! │   ├── customer.rs ◄─── Loyalty members and redemption
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── sale.rs     ◄─── Checkout, void, receipts
//! │   └── report.rs   ◄─── Daily reports and alerts
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use state::{CartState, ConfigState, DbState};
use vastra_db::{Database, DbConfig};

/// Everything a command may ask for.
#[derive(Debug, Clone)]
pub struct App {
    pub db: DbState,
    pub cart: CartState,
    pub config: ConfigState,
}

/// Boots the service layer.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • VASTRA_* env > config.toml > defaults                             │
/// │                                                                         │
/// │  2. Determine Database Path ──────────────────────────────────────────► │
/// │     • VASTRA_DB_PATH, else the platform data directory                  │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState, CartState (empty session), ConfigState                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn bootstrap() -> Result<App, ApiError> {
    let config = ConfigState::load()?;

    let db_path = get_database_path()?;
    info!(?db_path, "Database path determined");

    bootstrap_with(config, DbConfig::new(db_path)).await
}

/// Boots against an explicit configuration and database.
pub async fn bootstrap_with(config: ConfigState, db_config: DbConfig) -> Result<App, ApiError> {
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let app = App {
        db: DbState::new(db),
        cart: CartState::new(),
        config,
    };

    info!(store = %app.config.store_name, "State initialized");
    Ok(app)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vastra_db=trace` - Show trace for the database crate only
/// - Default: `info,vastra=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vastra=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Platform data directory, e.g. `~/.local/share/vastra` on Linux.
pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("in", "vastra", "vastra").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/in.vastra.vastra/vastra.db`
/// - **Windows**: `%APPDATA%\vastra\vastra\data\vastra.db`
/// - **Linux**: `~/.local/share/vastra/vastra.db`
///
/// ## Development Override
/// Set `VASTRA_DB_PATH` to use a custom path.
pub fn get_database_path() -> Result<PathBuf, ApiError> {
    if let Ok(path) = std::env::var("VASTRA_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let data_dir =
        data_dir().ok_or_else(|| ApiError::config("Could not determine app data directory"))?;

    std::fs::create_dir_all(&data_dir).map_err(|e| {
        ApiError::config(format!("Cannot create {}: {}", data_dir.display(), e))
    })?;

    Ok(data_dir.join("vastra.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let app = bootstrap_with(ConfigState::default(), DbConfig::new(&path))
            .await
            .unwrap();

        assert!(app.db.inner().health_check().await);
        assert!(path.exists());
        assert!(app.cart.with_session(|s| s.cart.is_empty()));
        app.db.inner().close().await;
    }
}
