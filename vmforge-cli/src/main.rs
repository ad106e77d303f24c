//! vmforge CLI
//!
//! Command-line interface for generating VM templates from distribution
//! cloud images on an XO-style control plane.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, Session, handle_command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "vmforge")]
#[command(about = "Turn cloud images into VM templates", long_about = None)]
struct Cli {
    /// Control-plane API URL
    #[arg(short = 'u', long = "url", env = "XOA_URL")]
    url: String,

    /// Control-plane API token
    #[arg(short = 't', long = "token", env = "XOA_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vmforge=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let session = Session {
        url: cli.url,
        token: cli.token,
    };

    handle_command(cli.command, &session).await
}
