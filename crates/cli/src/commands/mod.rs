//! CLI subcommands.

pub mod brands;
pub mod migrate;
pub mod products;
pub mod seed;
pub mod support;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use model2design_storefront::db::{self, Repositories, RepositoryError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid product file: {0}")]
    ProductFile(#[from] serde_yaml::Error),

    #[error("No default brand found. Run 'm2d-cli seed brands' first.")]
    NoDefaultBrand,

    #[error("Support submission {0} not found")]
    SubmissionNotFound(i32),
}

/// Connect to the storefront database named by the environment.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Connect and wrap the pool in repositories.
pub async fn repositories() -> Result<Repositories, CliError> {
    let pool = connect().await?;
    Ok(Repositories::postgres(&pool))
}
