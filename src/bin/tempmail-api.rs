//! HTTP server for disposable GuerrillaMail inboxes

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tempmail_api::{MailboxSession, ServerConfig, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempmail-api")]
#[command(about = "HTTP API for disposable email inboxes")]
struct Args {
    /// Address to listen on (overrides TEMPMAIL_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    // Startup does not contact GuerrillaMail; the token is fetched by the first request
    let client = config.provider.client_builder().build_lazy()?;
    info!("Serving GuerrillaMail inboxes");

    let session = Arc::new(MailboxSession::new(client));
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    server::serve(listener, server::router(session)).await?;
    Ok(())
}
