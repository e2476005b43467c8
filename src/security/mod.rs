//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client counting window)
//!     → token.rs (bearer token verification)
//!     → roles.rs (required role check)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: unknown roles and unverifiable tokens are rejected
//! - No trust in client input
//! - Each component is built from config and shared by `Arc`; no globals

pub mod rate_limit;
pub mod roles;
pub mod token;

pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use roles::{Authorizer, RoleHierarchy};
pub use token::{Claims, TokenError, TokenService};
