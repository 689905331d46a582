//! Model2Design CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! m2d-cli migrate
//!
//! # Create the demo brands and the default brand
//! m2d-cli seed brands
//!
//! # Import or update products from a YAML (or JSON) file
//! m2d-cli products import --file products.yaml
//!
//! # List every unclaimed orderable product under the default brand
//! m2d-cli brands assign-default
//!
//! # Mark a support submission resolved
//! m2d-cli support resolve --id 42
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "m2d-cli")]
#[command(author, version, about = "Model2Design CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database with starter data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage brands
    Brands {
        #[command(subcommand)]
        action: BrandsAction,
    },
    /// Manage support submissions
    Support {
        #[command(subcommand)]
        action: SupportAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create the demo brands (acme, techgear) and the default brand
    Brands,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Insert or update products from a YAML or JSON list
    Import {
        /// Path to the product file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum BrandsAction {
    /// List orderable products no other brand carries under the default brand
    AssignDefault,
}

#[derive(Subcommand)]
enum SupportAction {
    /// Mark a submission resolved
    Resolve {
        /// Submission id
        #[arg(long)]
        id: i32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Brands => commands::seed::brands().await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::Import { file } => commands::products::import(&file).await?,
        },
        Commands::Brands { action } => match action {
            BrandsAction::AssignDefault => commands::brands::assign_default().await?,
        },
        Commands::Support { action } => match action {
            SupportAction::Resolve { id } => commands::support::resolve(id).await?,
        },
    }
    Ok(())
}
