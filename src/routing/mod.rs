//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Discovery (at startup):
//!     route root directory
//!     → loader.rs (walk, derive paths, resolve handlers)
//!     → manifest.rs (parse per-file guards)
//!     → table.rs (unique path → RouteEntry)
//!     → Freeze as immutable RouteTable
//!
//! Per request:
//!     axum path match → RouteEntry → RequestPipeline
//! ```
//!
//! # Design Decisions
//! - Routes resolved at startup, immutable at runtime
//! - Handlers come from an explicit registry, never loaded dynamically
//! - Deterministic: the same tree always loads in the same order
//! - Collisions are reported, first file wins

pub mod loader;
pub mod manifest;
pub mod table;

pub use loader::{LoadReport, RouteLoadError, RouteLoader};
pub use manifest::RouteManifest;
pub use table::{RouteEntry, RouteTable};
