use crate::cli::ServeArgs;
use crate::infra::{AppState, ListingStore};
use crate::routes::dashboard_app;
use axum_prometheus::PrometheusMetricLayer;
use iv_housing::config::AppConfig;
use iv_housing::error::AppError;
use iv_housing::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// The pipeline command stays synchronous, so only serving gets a runtime.
pub(crate) fn serve(args: ServeArgs) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}

async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dataset) = args.dataset.take() {
        config.pipeline.dataset_path = dataset;
    }

    telemetry::init(&config.telemetry)?;

    let store = ListingStore::load(&config.pipeline.dataset_path)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let listings = store.records().len();
    let dataset = store.source().display().to_string();
    let app = dashboard_app(store, app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, listings, %dataset, "housing dashboard ready");

    axum::serve(listener, app).await?;
    Ok(())
}
