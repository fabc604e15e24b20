//! Production-cycle arithmetic: stock on hand, biomass, ABW, FCR and growth.
//!
//! Everything here is a pure function over the records of a single cycle so
//! the service, the dashboard and the tests share one set of formulas.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::domain::{
    Cage, CageStatus, DailyRecord, GrowthSample, HarvestRecord, StockingId, StockingRecord,
    StockingStatus,
};

/// Records belonging to one production cycle of a cage.
#[derive(Debug, Clone, Default)]
pub struct CycleLedger {
    pub cycle: Option<StockingId>,
    /// Approved stockings of the cycle (initial plus top-ups).
    pub stockings: Vec<StockingRecord>,
    pub daily: Vec<DailyRecord>,
    pub samples: Vec<GrowthSample>,
    pub harvests: Vec<HarvestRecord>,
}

impl CycleLedger {
    pub fn new(
        cycle: StockingId,
        stockings: Vec<StockingRecord>,
        mut daily: Vec<DailyRecord>,
        mut samples: Vec<GrowthSample>,
        mut harvests: Vec<HarvestRecord>,
    ) -> Self {
        let stockings = stockings
            .into_iter()
            .filter(|record| {
                record.status == StockingStatus::Approved && record.cycle.as_ref() == Some(&cycle)
            })
            .collect();
        daily.sort_by(|a, b| a.date.cmp(&b.date));
        samples.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        harvests.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        Self {
            cycle: Some(cycle),
            stockings,
            daily,
            samples,
            harvests,
        }
    }

    pub fn stocked_count(&self) -> u32 {
        saturating_total(self.stockings.iter().map(|record| record.fish_count))
    }

    pub fn mortality(&self) -> u32 {
        saturating_total(self.daily.iter().map(|record| record.mortality))
    }

    pub fn harvested_count(&self) -> u32 {
        saturating_total(self.harvests.iter().map(|record| record.fish_count))
    }

    /// Fish still in the cage.
    pub fn current_stock(&self) -> u32 {
        self.stocked_count()
            .saturating_sub(self.mortality().saturating_add(self.harvested_count()))
    }

    pub fn stocked_biomass_kg(&self) -> f64 {
        self.stockings.iter().map(StockingRecord::biomass_kg).sum()
    }

    /// Count-weighted ABW across all approved stockings.
    pub fn stocked_abw_g(&self) -> f64 {
        let count = self.stocked_count();
        if count == 0 {
            return 0.0;
        }
        self.stocked_biomass_kg() * 1000.0 / f64::from(count)
    }

    /// Most recent sampled ABW, falling back to the stocking ABW.
    pub fn latest_abw_g(&self) -> f64 {
        self.samples
            .last()
            .map(|sample| sample.average_weight_g)
            .unwrap_or_else(|| self.stocked_abw_g())
    }

    pub fn total_feed_kg(&self) -> f64 {
        self.daily.iter().map(|record| record.feed_kg).sum()
    }

    pub fn harvested_biomass_kg(&self) -> f64 {
        self.harvests.iter().map(|record| record.total_weight_kg).sum()
    }

    pub fn last_daily_record(&self) -> Option<NaiveDate> {
        self.daily.last().map(|record| record.date)
    }

    pub fn metrics(&self, cage: &Cage, today: NaiveDate, window_days: u32) -> Option<CycleMetrics> {
        let cycle = self.cycle.clone()?;
        let stocking_date = cage.stocking_date?;

        let end_date = if cage.status == CageStatus::Harvested {
            self.harvests.last().map(|record| record.date).unwrap_or(today)
        } else {
            today
        };
        let days_of_culture = days_between(stocking_date, end_date);

        let stocked_count = self.stocked_count();
        let mortality = self.mortality();
        let harvested_count = self.harvested_count();
        let current_count = self.current_stock();

        let survival_rate_pct = if stocked_count == 0 {
            0.0
        } else {
            (f64::from(current_count) + f64::from(harvested_count)) / f64::from(stocked_count)
                * 100.0
        };

        let stocked_biomass_kg = self.stocked_biomass_kg();
        let latest_abw_g = self.latest_abw_g();
        let current_biomass_kg = f64::from(current_count) * latest_abw_g / 1000.0;
        let harvested_biomass_kg = self.harvested_biomass_kg();
        let biomass_gain_kg = current_biomass_kg + harvested_biomass_kg - stocked_biomass_kg;
        let total_feed_kg = self.total_feed_kg();

        // Reporting dates near the calendar floor keep every record in the window.
        let window_start = today.checked_sub_signed(Duration::days(i64::from(window_days)));
        let recent = self.daily.iter().filter(|record| {
            record.date <= today && window_start.map_or(true, |start| record.date > start)
        });
        let (recent_feed_kg, recent_mortality) = recent.fold((0.0, 0u32), |(feed, dead), record| {
            (feed + record.feed_kg, dead.saturating_add(record.mortality))
        });

        let density_kg_m3 = cage
            .volume_m3
            .filter(|volume| *volume > 0.0)
            .map(|volume| current_biomass_kg / volume);

        Some(CycleMetrics {
            cycle,
            stocking_date,
            days_of_culture,
            stocked_count,
            mortality,
            harvested_count,
            current_count,
            survival_rate_pct,
            stocked_biomass_kg,
            latest_abw_g,
            current_biomass_kg,
            harvested_biomass_kg,
            biomass_gain_kg,
            total_feed_kg,
            recent_feed_kg,
            recent_mortality,
            fcr: feed_conversion_ratio(total_feed_kg, biomass_gain_kg),
            density_kg_m3,
            last_daily_record: self.last_daily_record(),
        })
    }

    /// ABW per sample with the average daily gain since the previous point.
    pub fn growth_curve(&self, stocking_date: NaiveDate) -> Vec<GrowthPoint> {
        let mut previous = (stocking_date, self.stocked_abw_g());
        self.samples
            .iter()
            .map(|sample| {
                let (previous_date, previous_abw) = previous;
                let elapsed = days_between(previous_date, sample.date);
                let daily_gain_g = if elapsed > 0 {
                    Some((sample.average_weight_g - previous_abw) / elapsed as f64)
                } else {
                    None
                };
                previous = (sample.date, sample.average_weight_g);
                GrowthPoint {
                    date: sample.date,
                    days_of_culture: days_between(stocking_date, sample.date),
                    average_weight_g: sample.average_weight_g,
                    daily_gain_g,
                }
            })
            .collect()
    }
}

/// Snapshot of a cycle's performance on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleMetrics {
    pub cycle: StockingId,
    pub stocking_date: NaiveDate,
    pub days_of_culture: i64,
    pub stocked_count: u32,
    pub mortality: u32,
    pub harvested_count: u32,
    pub current_count: u32,
    pub survival_rate_pct: f64,
    pub stocked_biomass_kg: f64,
    pub latest_abw_g: f64,
    pub current_biomass_kg: f64,
    pub harvested_biomass_kg: f64,
    pub biomass_gain_kg: f64,
    pub total_feed_kg: f64,
    pub recent_feed_kg: f64,
    pub recent_mortality: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_kg_m3: Option<f64>,
    pub last_daily_record: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub days_of_culture: i64,
    pub average_weight_g: f64,
    pub daily_gain_g: Option<f64>,
}

fn saturating_total(counts: impl Iterator<Item = u32>) -> u32 {
    counts.fold(0, u32::saturating_add)
}

/// Elapsed whole days, never negative.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days().max(0)
}

/// Feed per kilogram of biomass gained; undefined without feed or gain.
pub fn feed_conversion_ratio(total_feed_kg: f64, biomass_gain_kg: f64) -> Option<f64> {
    if total_feed_kg > 0.0 && biomass_gain_kg > 0.0 {
        Some(total_feed_kg / biomass_gain_kg)
    } else {
        None
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
