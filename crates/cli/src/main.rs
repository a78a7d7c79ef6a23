//! AQUA DEKOR CLI - catalog seeding and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Load categories and products from a YAML file
//! ad-cli seed catalog crates/cli/seed/catalog.yaml
//!
//! # Validate a seed file without writing anything
//! ad-cli seed catalog crates/cli/seed/catalog.yaml --dry-run
//!
//! # Grant or revoke the admin flag on an existing account
//! ad-cli admin grant -e admin@example.com
//! ad-cli admin revoke -e admin@example.com
//!
//! # List admins
//! ad-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Backend project URL
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key (bypasses row-level
//!   security, never give it to the storefront)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ad-cli")]
#[command(author, version, about = "AQUA DEKOR CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the backend with catalog data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert categories and products from a YAML file
    Catalog {
        /// Path to the YAML seed file
        file: String,

        /// Parse and validate only
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing account access to the admin area
    Grant {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Remove admin access from an account
    Revoke {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// List accounts with admin access
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, dry_run } => {
                commands::seed::catalog(&file, dry_run).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Revoke { email } => commands::admin::set_admin(&email, false).await?,
            AdminAction::List => commands::admin::list().await?,
        },
    }
    Ok(())
}
