use crate::cli::ServeArgs;
use crate::infra::{AppState, Platform};
use crate::routes::with_platform_routes;
use activity_approvals::config::AppConfig;
use activity_approvals::error::AppError;
use activity_approvals::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (platform, outbox_worker) = Platform::start(&config.notifications);
    let app = with_platform_routes(&platform)
        .layer(Extension(app_state))
        .layer(prometheus_layer);
    // the outbox closes once the router, the last service handle, is dropped
    drop(platform);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        push_timeout_ms = config.notifications.push_timeout.as_millis() as u64,
        outbox_capacity = config.notifications.outbox_capacity,
        "activity approvals service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    info!("draining notification outbox");
    outbox_worker.join().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
