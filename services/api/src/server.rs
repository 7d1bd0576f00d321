use crate::cli::ServeArgs;
use crate::infra::{load_engine, ruleset_source, AppState};
use crate::routes::router;
use ai_compliance::config::AppConfig;
use ai_compliance::error::AppError;
use ai_compliance::telemetry;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
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

    let engine = Arc::new(load_engine(ruleset_source(
        &config.ruleset,
        args.ruleset.take(),
    ))?);
    let summary = engine.summary();

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        engine,
    };

    let app = router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        ruleset_version = %summary.ruleset_version,
        rules = summary.rule_count,
        "compliance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
