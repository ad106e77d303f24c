//! Command handlers

mod generate;
mod templates;

pub use generate::GenerateArgs;

use anyhow::{Context, Result};
use clap::Subcommand;
use vmforge_client::XoClient;

/// Connection settings shared by all commands.
pub struct Session {
    pub url: String,
    pub token: String,
}

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate templates from a configuration file
    Generate(GenerateArgs),
    /// List templates present on the platform
    ListTemplates,
}

/// Route a command to its handler.
pub async fn handle_command(command: Commands, session: &Session) -> Result<()> {
    match command {
        Commands::Generate(args) => generate::handle_generate(args, session).await,
        Commands::ListTemplates => templates::handle_list_templates(session).await,
    }
}

/// Build a control-plane client with the standard per-call timeout.
pub(crate) fn build_client(session: &Session) -> Result<XoClient> {
    let http = reqwest::Client::builder()
        .timeout(vmforge_client::DEFAULT_CALL_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    Ok(XoClient::with_client(&session.url, &session.token, http))
}
