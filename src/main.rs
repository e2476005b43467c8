//! API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     API GATEWAY                      │
//!                      │                                                      │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!   ───────────────────┼─▶│  http    │──▶│ rate limit │──▶│ bearer token  │   │
//!                      │  │  server  │   │  (window)  │   │ verification  │   │
//!                      │  └──────────┘   └────────────┘   └───────┬───────┘   │
//!                      │                                          │           │
//!                      │                                          ▼           │
//!   Client Response    │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!   ◀──────────────────┼──│  error   │◀──│  handler   │◀──│  role check   │   │
//!                      │  │ mapping  │   │  dispatch  │   │  (hierarchy)  │   │
//!                      │  └──────────┘   └────────────┘   └───────────────┘   │
//!                      │                                                      │
//!                      │  ┌────────────────────────────────────────────────┐  │
//!                      │  │  startup: config → route discovery → listener  │  │
//!                      │  └────────────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::lifecycle::{signals, startup, Shutdown};
use api_gateway::{HandlerRegistry, HttpServer};

#[derive(Parser)]
#[command(name = "api-gateway", version, about = "Authenticating API gateway")]
struct Args {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = startup::prepare(args.config.as_deref())?;

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let server = HttpServer::new(config, &HandlerRegistry::builtin());

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
