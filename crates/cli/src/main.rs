//! Gallery Checkout CLI - inspect and exercise checkout pages.
//!
//! # Usage
//!
//! ```bash
//! # Show the detected mode and the order payload a page would submit
//! checkout-cli inspect page.json
//!
//! # Create an order and start its payment intent against the backend
//! CHECKOUT_API_BASE_URL=http://localhost:8000 checkout-cli place-order page.yaml
//! ```
//!
//! Page files are `Document` snapshots in JSON or YAML (chosen by file
//! extension).
//!
//! # Commands
//!
//! - `inspect` - Offline look at a page snapshot
//! - `place-order` - Run a fresh checkout up to the mounted payment form

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "checkout-cli")]
#[command(version, about = "Gallery checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected mode and the order payload of a page snapshot
    Inspect {
        /// Page snapshot (.json, .yaml or .yml)
        page: PathBuf,
    },
    /// Create an order and start payment for a fresh checkout page
    PlaceOrder {
        /// Page snapshot (.json, .yaml or .yml)
        page: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gallery_checkout=info,checkout_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Inspect { page } => commands::inspect::run(&page)?,
        Commands::PlaceOrder { page } => commands::place_order::run(&page).await?,
    }
    Ok(())
}
