//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! m2d-cli migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/` and include the
//! `tower_sessions.session` table used by the session store.

use super::{CliError, connect};

/// Run storefront database migrations.
pub async fn storefront() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
