use std::io::Read;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::{
    next_id, optional_text, positive_amount, positive_count, FarmError, FarmService,
    RECORD_SEQUENCE,
};
use crate::farm::access::{Actor, Permission};
use crate::farm::domain::{
    average_weight_g, Cage, CageId, CageStatus, DailyRecord, GrowthSample, HarvestKind,
    HarvestRecord, RecordId, StockingId,
};
use crate::farm::feed_log::{export_feed_log, parse_feed_log, FeedLogImport, RejectedRow};
use crate::farm::metrics::CycleLedger;
use crate::farm::repository::{FarmRepository, RepositoryError};
use crate::farm::requests::{DailyRecordInput, HarvestInput, SampleInput};

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    /// Log the day's feeding, mortality and water quality for a stocked cage.
    pub fn record_daily(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        input: DailyRecordInput,
    ) -> Result<DailyRecord, FarmError> {
        actor.require(Permission::RecordOperations)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let (cycle, ledger) = self.stocked_cycle(&cage)?;
        self.ensure_cycle_date(&cage, input.date)?;

        if !(input.feed_kg.is_finite() && input.feed_kg >= 0.0) {
            return Err(FarmError::Validation(
                "feed_kg must be zero or more".to_string(),
            ));
        }
        if let Some(oxygen) = input.dissolved_oxygen_mg_l {
            if !(oxygen.is_finite() && oxygen >= 0.0) {
                return Err(FarmError::Validation(
                    "dissolved_oxygen_mg_l must be zero or more".to_string(),
                ));
            }
        }
        if input.water_temp_c.is_some_and(|temp| !temp.is_finite()) {
            return Err(FarmError::Validation(
                "water_temp_c must be a number".to_string(),
            ));
        }
        let stock = ledger.current_stock();
        if input.mortality > stock {
            return Err(FarmError::Validation(format!(
                "mortality of {} exceeds the {stock} fish in the cage",
                input.mortality
            )));
        }

        let record = DailyRecord {
            id: RecordId(next_id(&RECORD_SEQUENCE, "rec")),
            cage_id: cage.id.clone(),
            cycle,
            date: input.date,
            feed_kg: input.feed_kg,
            feed_type: optional_text(input.feed_type),
            mortality: input.mortality,
            water_temp_c: input.water_temp_c,
            dissolved_oxygen_mg_l: input.dissolved_oxygen_mg_l,
            notes: optional_text(input.notes),
            recorded_by: actor.id().clone(),
        };

        match self.repository.insert_daily(record) {
            Ok(record) => Ok(record),
            Err(RepositoryError::Conflict) => Err(FarmError::Conflict(format!(
                "a daily record for {} already exists on {}",
                cage.name, input.date
            ))),
            Err(other) => Err(other.into()),
        }
    }

    /// Record a biweekly growth sample; ABW is derived from the weighed fish.
    pub fn record_sample(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        input: SampleInput,
    ) -> Result<GrowthSample, FarmError> {
        actor.require(Permission::RecordOperations)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let (cycle, ledger) = self.stocked_cycle(&cage)?;
        self.ensure_cycle_date(&cage, input.date)?;

        let sample_count = positive_count(input.sample_count, "sample_count")?;
        let sample_weight_kg = positive_amount(input.sample_weight_kg, "sample_weight_kg")?;
        let stock = ledger.current_stock();
        if sample_count > stock {
            return Err(FarmError::Validation(format!(
                "sample of {sample_count} fish exceeds the {stock} fish in the cage"
            )));
        }

        let sample = self.repository.insert_sample(GrowthSample {
            id: RecordId(next_id(&RECORD_SEQUENCE, "rec")),
            cage_id: cage.id.clone(),
            cycle,
            date: input.date,
            sample_count,
            sample_weight_kg,
            average_weight_g: average_weight_g(sample_weight_kg, sample_count),
            notes: optional_text(input.notes),
            recorded_by: actor.id().clone(),
        })?;
        Ok(sample)
    }

    /// Record a harvest. A harvest that empties the cage closes it out as
    /// `harvested` whatever kind was requested.
    pub fn record_harvest(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        input: HarvestInput,
    ) -> Result<HarvestRecord, FarmError> {
        actor.require(Permission::RecordOperations)?;
        let mut cage = self.cage_in_scope(actor, cage_id)?;
        let (cycle, ledger) = self.stocked_cycle(&cage)?;
        self.ensure_cycle_date(&cage, input.date)?;

        let fish_count = positive_count(input.fish_count, "fish_count")?;
        let total_weight_kg = positive_amount(input.total_weight_kg, "total_weight_kg")?;
        let stock = ledger.current_stock();
        if fish_count > stock {
            return Err(FarmError::Validation(format!(
                "harvest of {fish_count} fish exceeds the {stock} fish in the cage"
            )));
        }

        let kind = if fish_count == stock {
            HarvestKind::Full
        } else {
            input.kind
        };

        let record = self.repository.insert_harvest(HarvestRecord {
            id: RecordId(next_id(&RECORD_SEQUENCE, "rec")),
            cage_id: cage.id.clone(),
            cycle,
            date: input.date,
            kind,
            fish_count,
            total_weight_kg,
            average_weight_g: average_weight_g(total_weight_kg, fish_count),
            buyer: optional_text(input.buyer),
            notes: optional_text(input.notes),
            recorded_by: actor.id().clone(),
        })?;

        let previous = cage.status;
        cage.status = match kind {
            HarvestKind::Full => CageStatus::Harvested,
            HarvestKind::Partial => CageStatus::Harvesting,
        };
        cage.updated_on = self.today();
        self.repository.update_cage(cage.clone())?;

        info!(
            cage_id = %cage.id,
            fish = fish_count,
            weight_kg = total_weight_kg,
            from = previous.label(),
            to = cage.status.label(),
            "harvest recorded"
        );
        Ok(record)
    }

    /// Daily records of the current cycle, newest first.
    pub fn daily_records(
        &self,
        actor: &Actor,
        cage_id: &CageId,
    ) -> Result<Vec<DailyRecord>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let mut records = self.ledger(&cage)?.daily;
        records.reverse();
        Ok(records)
    }

    /// Growth samples of the current cycle, oldest first.
    pub fn growth_samples(
        &self,
        actor: &Actor,
        cage_id: &CageId,
    ) -> Result<Vec<GrowthSample>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        Ok(self.ledger(&cage)?.samples)
    }

    /// Harvests of the current cycle, oldest first.
    pub fn harvests(
        &self,
        actor: &Actor,
        cage_id: &CageId,
    ) -> Result<Vec<HarvestRecord>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        Ok(self.ledger(&cage)?.harvests)
    }

    /// Current-cycle feed log as CSV.
    pub fn export_daily_csv(&self, actor: &Actor, cage_id: &CageId) -> Result<String, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let ledger = self.ledger(&cage)?;
        Ok(export_feed_log(&ledger.daily)?)
    }

    /// Record every usable row of an uploaded feed log. Rows that fail
    /// parsing or validation are reported back; the rest are kept.
    pub fn import_daily_csv<Rd: Read>(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        reader: Rd,
    ) -> Result<FeedLogImport, FarmError> {
        actor.require(Permission::RecordOperations)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let rows = parse_feed_log(reader)?;

        let mut imported = Vec::new();
        let mut rejected = Vec::new();
        for row in rows {
            let input = match row.entry {
                Ok(input) => input,
                Err(reason) => {
                    rejected.push(RejectedRow {
                        line: row.line,
                        reason,
                    });
                    continue;
                }
            };
            match self.record_daily(actor, &cage.id, input) {
                Ok(record) => imported.push(record),
                Err(err @ (FarmError::Repository(_) | FarmError::Access(_))) => return Err(err),
                Err(err) => rejected.push(RejectedRow {
                    line: row.line,
                    reason: err.to_string(),
                }),
            }
        }

        if !rejected.is_empty() {
            warn!(cage_id = %cage.id, rejected = rejected.len(), "feed log rows rejected");
        }
        info!(cage_id = %cage.id, imported = imported.len(), "feed log imported");
        Ok(FeedLogImport {
            cage_id: cage.id,
            imported,
            rejected,
        })
    }

    /// Current cycle of a cage that holds fish.
    fn stocked_cycle(&self, cage: &Cage) -> Result<(StockingId, CycleLedger), FarmError> {
        match (&cage.current_cycle, cage.status.holds_stock()) {
            (Some(cycle), true) => Ok((cycle.clone(), self.ledger(cage)?)),
            _ => Err(FarmError::Conflict(format!(
                "cage {} is {} and does not hold stock",
                cage.name,
                cage.status.label()
            ))),
        }
    }

    /// Operational records must fall between stocking and today.
    fn ensure_cycle_date(&self, cage: &Cage, date: NaiveDate) -> Result<(), FarmError> {
        if date > self.today() {
            return Err(FarmError::Validation(format!("{date} is in the future")));
        }
        if let Some(stocked_on) = cage.stocking_date {
            if date < stocked_on {
                return Err(FarmError::Validation(format!(
                    "{date} is before the stocking date {stocked_on}"
                )));
            }
        }
        Ok(())
    }
}
