use chrono::NaiveDate;

use super::views::{
    AlertSeverity, CageRow, DashboardReport, FarmAlert, HarvestEntry, StatusCount,
};
use crate::farm::domain::{Cage, CageStatus, HarvestRecord};
use crate::farm::metrics::{days_between, round_to, CycleMetrics};

const FCR_WARNING: f64 = 2.0;
const MORTALITY_CRITICAL_PCT: f64 = 5.0;
const STALE_LOG_DAYS: i64 = 2;
const RECENT_HARVESTS: usize = 5;

/// A cage with the figures of its current cycle, if any.
#[derive(Debug, Clone)]
pub struct CageSnapshot {
    pub cage: Cage,
    pub metrics: Option<CycleMetrics>,
    pub harvests: Vec<HarvestRecord>,
}

impl CageSnapshot {
    fn row(&self) -> CageRow {
        let metrics = self.metrics.as_ref();
        CageRow {
            cage_id: self.cage.id.clone(),
            name: self.cage.name.clone(),
            status: self.cage.status,
            status_label: self.cage.status.label(),
            days_of_culture: metrics.map(|m| m.days_of_culture),
            fish: metrics.map_or(0, |m| m.current_count),
            biomass_kg: round_to(metrics.map_or(0.0, |m| m.current_biomass_kg), 2),
            abw_g: metrics.map(|m| round_to(m.latest_abw_g, 2)),
            fcr: metrics.and_then(|m| m.fcr).map(|fcr| round_to(fcr, 2)),
            last_daily_record: metrics.and_then(|m| m.last_daily_record),
        }
    }

    fn alerts(&self, today: NaiveDate) -> Vec<FarmAlert> {
        let Some(metrics) = &self.metrics else {
            return Vec::new();
        };
        let mut alerts = Vec::new();

        if let Some(fcr) = metrics.fcr.filter(|fcr| *fcr > FCR_WARNING) {
            alerts.push(self.alert(
                "Feed conversion",
                format!("FCR {:.2} is above {FCR_WARNING:.1}", fcr),
                AlertSeverity::Warning,
            ));
        }

        if metrics.stocked_count > 0 {
            let pct = f64::from(metrics.recent_mortality) / f64::from(metrics.stocked_count) * 100.0;
            if pct > MORTALITY_CRITICAL_PCT {
                alerts.push(self.alert(
                    "Mortality",
                    format!(
                        "{} fish lost recently ({pct:.1}% of stocked)",
                        metrics.recent_mortality
                    ),
                    AlertSeverity::Critical,
                ));
            }
        }

        if self.cage.status == CageStatus::Active && metrics.days_of_culture >= STALE_LOG_DAYS {
            let stale = match metrics.last_daily_record {
                Some(last) => days_between(last, today) >= STALE_LOG_DAYS,
                None => true,
            };
            if stale {
                let detail = match metrics.last_daily_record {
                    Some(last) => format!("last daily record on {last}"),
                    None => "no daily records logged this cycle".to_string(),
                };
                alerts.push(self.alert("Daily log", detail, AlertSeverity::Warning));
            }
        }

        alerts
    }

    fn alert(&self, topic: &'static str, detail: String, severity: AlertSeverity) -> FarmAlert {
        FarmAlert {
            cage_id: self.cage.id.clone(),
            cage_name: self.cage.name.clone(),
            topic,
            detail,
            severity,
            severity_label: severity.label(),
        }
    }
}

impl DashboardReport {
    pub fn build(
        snapshots: &[CageSnapshot],
        pending_approvals: usize,
        today: NaiveDate,
        window_days: u32,
    ) -> Self {
        let status_counts = CageStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status,
                status_label: status.label(),
                count: snapshots
                    .iter()
                    .filter(|snapshot| snapshot.cage.status == status)
                    .count(),
            })
            .collect();

        let metrics: Vec<&CycleMetrics> = snapshots
            .iter()
            .filter_map(|snapshot| snapshot.metrics.as_ref())
            .collect();

        let fcrs: Vec<f64> = metrics.iter().filter_map(|m| m.fcr).collect();
        let average_fcr = if fcrs.is_empty() {
            None
        } else {
            Some(round_to(fcrs.iter().sum::<f64>() / fcrs.len() as f64, 2))
        };

        let mut recent_harvests: Vec<HarvestEntry> = snapshots
            .iter()
            .flat_map(|snapshot| {
                snapshot.harvests.iter().map(|harvest| HarvestEntry {
                    cage_id: snapshot.cage.id.clone(),
                    cage_name: snapshot.cage.name.clone(),
                    date: harvest.date,
                    kind: harvest.kind,
                    fish_count: harvest.fish_count,
                    total_weight_kg: harvest.total_weight_kg,
                })
            })
            .collect();
        recent_harvests.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.cage_id.cmp(&b.cage_id)));
        recent_harvests.truncate(RECENT_HARVESTS);

        let mut alerts: Vec<FarmAlert> = snapshots
            .iter()
            .flat_map(|snapshot| snapshot.alerts(today))
            .collect();
        alerts.sort_by_key(|alert| alert.severity != AlertSeverity::Critical);

        Self {
            today,
            window_days,
            status_counts,
            active_cages: snapshots
                .iter()
                .filter(|snapshot| snapshot.cage.status.holds_stock())
                .count(),
            total_fish: metrics.iter().map(|m| u64::from(m.current_count)).sum(),
            total_biomass_kg: round_to(metrics.iter().map(|m| m.current_biomass_kg).sum(), 2),
            total_feed_kg: round_to(metrics.iter().map(|m| m.total_feed_kg).sum(), 2),
            recent_feed_kg: round_to(metrics.iter().map(|m| m.recent_feed_kg).sum(), 2),
            recent_mortality: metrics
                .iter()
                .map(|m| u64::from(m.recent_mortality))
                .sum(),
            average_fcr,
            pending_approvals,
            recent_harvests,
            cages: snapshots.iter().map(CageSnapshot::row).collect(),
            alerts,
        }
    }
}
