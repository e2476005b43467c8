//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Discover routes and build the Axum Router from the route table
//! - Wire up middleware (tracing, timeout, body limit, request ID, CORS)
//! - Run the guard pipeline in front of every mounted handler
//! - Sweep expired rate-limit buckets in the background
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderName, Method, Request, StatusCode},
    response::IntoResponse,
    routing::{any, on, MethodFilter, MethodRouter},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::handlers::{HandlerRegistry, Services};
use crate::http::context::X_REQUEST_ID;
use crate::http::pipeline::RequestPipeline;
use crate::observability::metrics;
use crate::routing::{LoadReport, RouteEntry, RouteLoader};
use crate::security::{RateLimiter, RoleHierarchy, TokenService};

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    pipeline: RequestPipeline,
    report: LoadReport,
}

impl HttpServer {
    /// Build every subsystem from `config` and scan the route root.
    pub fn new(config: GatewayConfig, registry: &HandlerRegistry) -> Self {
        let roles = RoleHierarchy::from_config(&config.roles);
        let report = RouteLoader::new(registry, &roles)
            .with_prefix(config.routes.prefix.clone())
            .load(&config.routes.root);
        metrics::record_routes_loaded(report.table.len(), report.failures.len());

        let tokens = Arc::new(TokenService::new(config.auth.signing_secret.clone()));
        if !tokens.is_configured() {
            tracing::warn!("No signing secret configured; authenticated routes will fail with 500");
        }

        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let services = Arc::new(Services::from_config(&config, tokens.clone(), report.table.len()));
        let pipeline = RequestPipeline::new(limiter, tokens, Arc::new(roles), services);

        let router = Self::build_router(&config, &report, &pipeline);
        Self {
            router,
            config,
            pipeline,
            report,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, report: &LoadReport, pipeline: &RequestPipeline) -> Router {
        let mut router = Router::new();
        for entry in report.table.iter() {
            router = router.route(&entry.path, mount(entry.clone(), pipeline.clone()));
        }

        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let timeout = TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeouts.request_secs),
        );

        // Outermost first: the request ID exists before tracing starts.
        // Timeout and CORS build their own responses, so they sit inside the
        // body limit, whose response body has no `Default`.
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(timeout)
            .layer(CorsLayer::permissive());

        router.fallback(not_found).layer(middleware)
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Routes and per-file failures from startup discovery.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.report.table.len(),
            "HTTP server starting"
        );

        if self.pipeline.limiter().is_enabled() {
            let limiter = self.pipeline.limiter().clone();
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
            let stop = shutdown.resubscribe();
            tokio::spawn(sweep_buckets(limiter, interval, stop));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Method router for one table entry: every request goes through the pipeline.
fn mount(entry: Arc<RouteEntry>, pipeline: RequestPipeline) -> MethodRouter {
    let filter = method_filter(&entry.methods);
    let handler = move |req: Request<Body>| async move { pipeline.handle(&entry, req).await };

    match filter {
        Some(filter) => on(filter, handler),
        None => any(handler),
    }
}

/// Union of the entry's methods; `None` means any method.
fn method_filter(methods: &[Method]) -> Option<MethodFilter> {
    methods
        .iter()
        .filter_map(|m| MethodFilter::try_from(m.clone()).ok())
        .reduce(MethodFilter::or)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

/// Periodically drop buckets whose window has elapsed.
async fn sweep_buckets(limiter: Arc<RateLimiter>, every: Duration, mut stop: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.sweep_expired(Instant::now());
                let remaining = limiter.tracked_clients();
                metrics::record_rate_limit_clients(remaining);
                if removed > 0 {
                    tracing::debug!(removed, remaining, "Swept expired rate-limit buckets");
                }
            }
            _ = stop.recv() => break,
        }
    }
}
