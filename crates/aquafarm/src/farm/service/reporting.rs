use chrono::NaiveDate;
use serde::Serialize;

use super::{FarmError, FarmService};
use crate::farm::access::{Actor, Permission};
use crate::farm::domain::{Cage, CageId, DailyRecord, StockingRecord};
use crate::farm::metrics::{CycleMetrics, GrowthPoint};
use crate::farm::report::{CageSnapshot, DashboardReport};
use crate::farm::repository::FarmRepository;

const RECENT_DAILY_RECORDS: usize = 7;

/// Cage detail page: inventory data, cycle figures and recent activity.
#[derive(Debug, Clone, Serialize)]
pub struct CageOverview {
    pub cage: Cage,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<CycleMetrics>,
    pub growth: Vec<GrowthPoint>,
    pub recent_daily: Vec<DailyRecord>,
    pub pending_stockings: Vec<StockingRecord>,
}

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    pub fn cage_overview(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        today: Option<NaiveDate>,
    ) -> Result<CageOverview, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let today = today.unwrap_or_else(|| self.today());
        let ledger = self.ledger(&cage)?;

        let metrics = ledger.metrics(&cage, today, self.feed_window_days);
        let growth = cage
            .stocking_date
            .map(|stocked_on| ledger.growth_curve(stocked_on))
            .unwrap_or_default();
        let recent_daily = ledger
            .daily
            .iter()
            .rev()
            .take(RECENT_DAILY_RECORDS)
            .cloned()
            .collect();
        let pending_stockings = self
            .repository
            .stockings_for_cage(&cage.id)?
            .into_iter()
            .filter(StockingRecord::is_pending)
            .collect();

        Ok(CageOverview {
            status_label: cage.status.label(),
            cage,
            metrics,
            growth,
            recent_daily,
            pending_stockings,
        })
    }

    /// Farm-wide dashboard for everything in the actor's scope.
    pub fn dashboard(
        &self,
        actor: &Actor,
        today: Option<NaiveDate>,
    ) -> Result<DashboardReport, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let today = today.unwrap_or_else(|| self.today());

        let mut cages = self.repository.cages(actor.scope())?;
        cages.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let snapshots = cages
            .into_iter()
            .map(|cage| {
                let ledger = self.ledger(&cage)?;
                let metrics = ledger.metrics(&cage, today, self.feed_window_days);
                Ok(CageSnapshot {
                    cage,
                    metrics,
                    harvests: ledger.harvests,
                })
            })
            .collect::<Result<Vec<_>, FarmError>>()?;

        let pending = self.repository.pending_stockings(actor.scope())?.len();
        Ok(DashboardReport::build(
            &snapshots,
            pending,
            today,
            self.feed_window_days,
        ))
    }
}
