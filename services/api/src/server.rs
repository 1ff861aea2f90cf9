use crate::cli::ServeArgs;
use crate::infra::{self, AppState};
use crate::routes::with_standings_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ctf_standings::config::AppConfig;
use ctf_standings::error::AppError;
use ctf_standings::telemetry;
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

    let service = infra::standings_service(&config.storage)?;

    let app = with_standings_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, backend = ?config.storage.backend, "standings service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
