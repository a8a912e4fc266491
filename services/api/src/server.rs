use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryGameServer};
use crate::routes::router;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use top_stats::config::AppConfig;
use top_stats::error::AppError;
use top_stats::stats::TopStatsService;
use top_stats::telemetry;
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
    let readiness_flag = Arc::new(AtomicBool::new(false));

    let game = Arc::new(InMemoryGameServer::default());
    let service = TopStatsService::new(Arc::clone(&game), config.top_stats.clone());
    let app_state = AppState::new(
        readiness_flag.clone(),
        prometheus_handle,
        game,
        service,
    );

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        server_number = %config.top_stats.server_number,
        chat_command = %config.top_stats.chat_command,
        "top stats service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
