//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers, request ID)
//!     → [axum path match against the route table]
//!     → pipeline.rs (rate limit → token → role → dispatch)
//!     → context.rs (immutable per-request identity for the handler)
//!     → error.rs (every failure becomes one JSON response)
//!     → Send to client
//! ```

pub mod context;
pub mod error;
pub mod pipeline;
pub mod server;

pub use context::{RequestContext, X_REQUEST_ID};
pub use error::{GatewayError, GatewayResult};
pub use pipeline::RequestPipeline;
pub use server::HttpServer;
