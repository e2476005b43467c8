//! Process lifecycle.
//!
//! ```text
//! startup.rs   .env → config file + env overrides → validate → logging/metrics
//! main.rs      → HttpServer::new (route scan) → bind → serve
//! signals.rs   Ctrl-C / SIGTERM → Shutdown::trigger
//! shutdown.rs  broadcast to the server (drain) and the bucket sweeper (stop)
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
