//! Logs and metrics.
//!
//! ```text
//! pipeline / loader / sweeper
//!     → logging.rs  tracing events with request_id, client and path fields
//!     → metrics.rs  request, rejection and route-load counters
//!                   (scraped from the Prometheus listener when enabled)
//! ```
//!
//! Without a recorder installed the metric macros are no-ops, so tests and the
//! CLI pay nothing for them.

pub mod logging;
pub mod metrics;
