use crate::cli::ServeArgs;
use crate::infra::{portal_seed, AppState};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bid_portal::config::AppConfig;
use bid_portal::error::AppError;
use bid_portal::portal::Portal;
use bid_portal::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seed = portal_seed(&config.portal)?;
    let portal = Arc::new(Portal::new(&config.portal, seed));
    if config.portal.allow_role_switching {
        warn!("role switching is enabled; do not expose this instance publicly");
    }

    let app = with_portal_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        latency_ms = config.portal.simulated_latency_ms,
        "bid portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
