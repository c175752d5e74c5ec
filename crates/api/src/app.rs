use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    Clock, EntryLog, OfflineReconciler, ScanCoordinator, SystemClock, TicketStore,
};
use persistence::{PgEntryLog, PgTicketStore};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, SecurityHeaders,
};
use crate::routes::{events, health, scans, tickets};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub tickets: Arc<dyn TicketStore>,
    pub entries: Arc<dyn EntryLog>,
    pub coordinator: Arc<ScanCoordinator>,
    pub reconciler: Arc<OfflineReconciler>,
}

/// Builds the router on the PostgreSQL stores and the system clock.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let jwt = config.jwt.build()?;
    let tickets: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool.clone()));
    let entries: Arc<dyn EntryLog> = Arc::new(PgEntryLog::new(pool.clone()));

    Ok(create_app_with_stores(
        config,
        pool,
        jwt,
        tickets,
        entries,
        Arc::new(SystemClock),
    ))
}

/// Builds the router on caller-supplied stores and clock.
///
/// The pool is only used by the health probes.
pub fn create_app_with_stores(
    config: Config,
    pool: PgPool,
    jwt: JwtConfig,
    tickets: Arc<dyn TicketStore>,
    entries: Arc<dyn EntryLog>,
    clock: Arc<dyn Clock>,
) -> Router {
    let config = Arc::new(config);

    let coordinator = ScanCoordinator::new(tickets.clone(), entries.clone(), clock.clone())
        .with_duplicate_window(config.checkin.duplicate_window());
    let reconciler = OfflineReconciler::new(tickets.clone(), entries.clone(), clock);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt: Arc::new(jwt),
        tickets,
        entries,
        coordinator: Arc::new(coordinator),
        reconciler: Arc::new(reconciler),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Staff routes authenticate through the StaffAuth / AdminAuth extractors.
    let staff_routes = Router::new()
        .route("/api/v1/scans", post(scans::scan_ticket))
        .route("/api/v1/scans/offline-sync", post(scans::sync_offline_scans))
        .route("/api/v1/tickets/:qr_id/entries", get(tickets::list_entries))
        .route(
            "/api/v1/events/:event_id/check-in-stats",
            get(events::check_in_stats),
        )
        .route(
            "/api/v1/admin/tickets/:qr_id/reset",
            post(tickets::reset_ticket),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            SecurityHeaders {
                hsts: config.security.hsts_enabled,
            },
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
