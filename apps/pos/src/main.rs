//! # Vastra POS Entry Point
//!
//! Boots the stack (logging, config, database, migrations) and prints the
//! store's status as JSON.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration
//! 3. Determine database path (app data directory)
//! 4. Connect to database & run migrations
//! 5. Print store status

use vastra_pos::commands::report;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vastra_pos::init_tracing();

    tracing::info!("Starting Vastra POS");

    let app = vastra_pos::bootstrap().await?;

    let status = report::store_status(&app.db, &app.config).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    app.db.inner().close().await;
    Ok(())
}
