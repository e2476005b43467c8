//! Authenticating API gateway library.

pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use handlers::HandlerRegistry;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
