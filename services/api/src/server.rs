use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_infra_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ridgeline::app::MemoryBackend;
use ridgeline::config::AppConfig;
use ridgeline::error::AppError;
use ridgeline::telemetry;
use ridgeline::workflows::catalog::SeedOutcome;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let backend = MemoryBackend::in_memory(&config);
    if let SeedOutcome::Seeded { tours, .. } = backend.catalog().seed()? {
        info!(tours, "launch catalog loaded");
    }

    let app = with_infra_routes(backend.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        prefix = %config.server.service_prefix,
        transitions = ?config.permits.transitions,
        "ridgeline backend ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
