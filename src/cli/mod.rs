pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::cli::config::Session;
use crate::client::{ApiClient, ClientError};

#[derive(Parser)]
#[command(name = "discountify-cli")]
#[command(about = "Discountify CLI - browse discounts and manage your shop from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (saved for later commands)")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, logout and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Shop registration and profile management")]
    Shop {
        #[command(subcommand)]
        cmd: commands::shop::ShopCommands,
    },

    #[command(about = "Browse, search and manage discounts")]
    Discount {
        #[command(subcommand)]
        cmd: commands::discount::DiscountCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Saved session plus an API client carrying its token
pub struct Context {
    pub session: Session,
    pub client: ApiClient,
    pub output_format: OutputFormat,
}

impl Context {
    pub fn new(mut session: Session, server: Option<String>, output_format: OutputFormat) -> anyhow::Result<Self> {
        if let Some(server) = server {
            if server != session.server_url {
                // A different server cannot honor the old token
                session.sign_out();
                session.server_url = server;
            }
        }

        let client = ApiClient::new(session.server_url.clone())?;
        client.set_token(session.token.clone());

        Ok(Self {
            session,
            client,
            output_format,
        })
    }

    /// Persist the session, picking up any token the server set or cleared
    pub fn save(&mut self) -> anyhow::Result<()> {
        self.session.token = self.client.token();
        config::save_session(&self.session)
    }

    /// Turn a client error into a CLI failure; JSON mode also emits the error envelope
    pub fn fail(&self, err: ClientError, fallback: &str) -> anyhow::Error {
        let message = err.user_message(fallback);
        if matches!(self.output_format, OutputFormat::Json) {
            if let Err(e) = utils::output_error(&self.output_format, &message, err.status()) {
                tracing::warn!("Failed to print error: {}", e);
            }
        }
        tracing::debug!("Client error: {}", err);
        anyhow::anyhow!(message)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let session = config::load_session()?;
    let mut ctx = Context::new(session, cli.server, output_format)?;

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut ctx).await,
        Commands::Shop { cmd } => commands::shop::handle(cmd, &mut ctx).await,
        Commands::Discount { cmd } => commands::discount::handle(cmd, &mut ctx).await,
    };

    ctx.save()?;
    result
}
