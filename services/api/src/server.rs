use crate::cli::ServeArgs;
use crate::infra::{farm_service, AppState};
use crate::routes::with_farm_routes;
use aquafarm::config::AppConfig;
use aquafarm::error::AppError;
use aquafarm::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = farm_service(&config.farm, None);
    match &config.farm.bootstrap_admin {
        Some(seed) => {
            let admin = service.bootstrap_admin(seed)?;
            info!(user_id = %admin.id, email = %admin.email, "administrator available");
        }
        None => warn!("FARM_ADMIN_EMAIL not set; no administrator can approve companies"),
    }

    let app = with_farm_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        feed_window_days = config.farm.feed_window_days,
        "aquafarm api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
