use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use aquafarm::config::FarmConfig;
use aquafarm::farm::{FarmService, InMemoryFarmStore};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;

pub(crate) type SharedFarmService = Arc<FarmService<InMemoryFarmStore>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Farm service over a fresh in-memory store. A fixed `today` pins the
/// service clock.
pub(crate) fn farm_service(config: &FarmConfig, today: Option<NaiveDate>) -> SharedFarmService {
    let service = FarmService::new(Arc::new(InMemoryFarmStore::default()), config);
    let service = match today {
        Some(today) => service.with_clock(Arc::new(move || today)),
        None => service,
    };
    Arc::new(service)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
