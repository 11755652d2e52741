//! ModaMatch CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog database migrations
//! mm-cli migrate catalog
//!
//! # Sign a webhook body the way Shopify and WooCommerce do
//! mm-cli webhook sign --secret shpss_... --file product.json
//!
//! # Inspect or reset a shopper's persisted settings
//! mm-cli settings show --store-id acme.myshopify.com
//! mm-cli settings clear --store-id acme.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `webhook sign` - Compute a webhook signature for local testing
//! - `settings` - Inspect persisted widget settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mm-cli")]
#[command(author, version, about = "ModaMatch CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Webhook helpers
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
    /// Inspect persisted shopper settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run catalog database migrations
    Catalog,
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Print the base64 HMAC-SHA256 signature of a request body
    Sign {
        /// Store webhook secret
        #[arg(short, long)]
        secret: String,

        /// File holding the exact request body
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the settings saved for a store
    Show {
        /// Store id (shop domain)
        #[arg(short, long)]
        store_id: String,

        /// Settings directory (default: `MODAMATCH_SETTINGS_DIR` or .modamatch)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Remove the settings saved for a store
    Clear {
        /// Store id (shop domain)
        #[arg(short, long)]
        store_id: String,

        /// Settings directory (default: `MODAMATCH_SETTINGS_DIR` or .modamatch)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Catalog => commands::migrate::catalog().await?,
        },
        Commands::Webhook { action } => match action {
            WebhookAction::Sign { secret, file } => {
                let signature = commands::webhook::sign_file(&secret, &file).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{signature}");
                }
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show { store_id, dir } => {
                let json = commands::settings::show(&store_id, dir)?;
                #[allow(clippy::print_stdout)]
                {
                    println!("{json}");
                }
            }
            SettingsAction::Clear { store_id, dir } => {
                commands::settings::clear(&store_id, dir)?;
            }
        },
    }
    Ok(())
}
