mod authz;
mod config;
mod email;
mod error;
mod extract;
mod fanout;
mod handlers;
mod identity;
mod metrics;
mod server;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use famlist_events_memory::MemoryBroker;
use famlist_store_sqlite::SqliteStore;

use config::ServerConfig;
use server::{AppState, EmailSender};

#[derive(Parser)]
#[command(name = "famlist-server")]
#[command(about = "Famlist family-group server")]
struct Cli {
    /// Database URL (sqlite://path/to/db.db). Defaults to ~/.famlist/store.db
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Server address
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr } => serve(cli.database_url, addr).await,
    }
}

async fn serve(database_url: Option<String>, addr: String) -> Result<(), Box<dyn std::error::Error>> {
    let store = match database_url {
        Some(url) => SqliteStore::open(&url).await?,
        None => SqliteStore::open_default().await?,
    };

    let config = ServerConfig::from_env()?;
    let email_sender = match &config.email {
        Some(email_config) => {
            let provider = email::create_provider(email_config)?;
            tracing::info!(from = %email_config.from_address, "invitation emails enabled");
            Some(Arc::new(EmailSender {
                provider,
                from_address: email_config.from_address.clone(),
                from_name: email_config.from_name.clone(),
            }))
        }
        None => {
            tracing::info!("no email provider configured, invitations are in-app only");
            None
        }
    };

    let handle = metrics::init_metrics();
    let state = AppState::new(
        Arc::new(store),
        Arc::new(MemoryBroker::new()),
        email_sender,
        Some(handle),
    );

    let app = server::router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
