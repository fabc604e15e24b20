use tracing::{info, warn};

use super::{
    next_id, optional_text, positive_amount, positive_count, required_text, FarmError,
    FarmService, STOCKING_SEQUENCE,
};
use crate::farm::access::{Actor, Permission};
use crate::farm::domain::{
    Cage, CageId, CageStatus, StockingId, StockingKind, StockingRecord, StockingStatus,
};
use crate::farm::repository::FarmRepository;
use crate::farm::requests::StockingRequest;

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    /// Ask for an empty or fallow cage to be stocked. Nothing changes on the
    /// cage until a manager approves the request.
    pub fn request_stocking(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        request: StockingRequest,
    ) -> Result<StockingRecord, FarmError> {
        actor.require(Permission::RequestStocking)?;
        let cage = self.cage_in_scope(actor, cage_id)?;

        if !cage.status.is_stockable() {
            return Err(FarmError::Conflict(format!(
                "cage {} is {}; initial stocking requires an empty or fallow cage",
                cage.name,
                cage.status.label()
            )));
        }
        let pending_initial = self
            .repository
            .stockings_for_cage(&cage.id)?
            .into_iter()
            .any(|record| record.is_pending() && record.kind == StockingKind::Initial);
        if pending_initial {
            return Err(FarmError::Conflict(format!(
                "cage {} already has a stocking awaiting approval",
                cage.name
            )));
        }

        self.validate_request(&request)?;
        if let Some(capacity) = cage.capacity {
            if request.fish_count > capacity {
                return Err(FarmError::Validation(format!(
                    "{} fish exceed the cage capacity of {capacity}",
                    request.fish_count
                )));
            }
        }

        self.insert_request(actor, &cage, StockingKind::Initial, None, request)
    }

    /// Ask for additional fish in an active cage.
    pub fn request_top_up(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        request: StockingRequest,
    ) -> Result<StockingRecord, FarmError> {
        actor.require(Permission::RequestStocking)?;
        let cage = self.cage_in_scope(actor, cage_id)?;

        let cycle = match (&cage.status, &cage.current_cycle) {
            (CageStatus::Active, Some(cycle)) => cycle.clone(),
            _ => {
                return Err(FarmError::Conflict(format!(
                    "cage {} is {}; top-ups require an active cage",
                    cage.name,
                    cage.status.label()
                )))
            }
        };

        self.validate_request(&request)?;
        if let Some(stocked_on) = cage.stocking_date {
            if request.stocking_date < stocked_on {
                return Err(FarmError::Validation(format!(
                    "top-up date {} is before the cycle stocking date {stocked_on}",
                    request.stocking_date
                )));
            }
        }
        self.ensure_room(&cage, request.fish_count, FarmError::Validation)?;

        self.insert_request(actor, &cage, StockingKind::TopUp, Some(cycle), request)
    }

    pub fn approve_stocking(
        &self,
        actor: &Actor,
        stocking_id: &StockingId,
    ) -> Result<StockingRecord, FarmError> {
        actor.require(Permission::ApproveStocking)?;
        let mut record = self.pending_request(actor, stocking_id)?;
        let mut cage = self.cage_in_scope(actor, &record.cage_id)?;
        let today = self.today();

        match record.kind {
            StockingKind::Initial => {
                if !cage.status.is_stockable() {
                    return Err(FarmError::Conflict(format!(
                        "cage {} is now {}; the stocking request is stale",
                        cage.name,
                        cage.status.label()
                    )));
                }
                if let Some(capacity) = cage.capacity {
                    if record.fish_count > capacity {
                        return Err(FarmError::Conflict(format!(
                            "{} fish exceed the cage capacity of {capacity}",
                            record.fish_count
                        )));
                    }
                }
                record.cycle = Some(record.id.clone());
                cage.status = CageStatus::Active;
                cage.current_cycle = Some(record.id.clone());
                cage.stocking_date = Some(record.stocking_date);
                cage.species = record.species.clone();
            }
            StockingKind::TopUp => {
                let same_cycle = cage.status == CageStatus::Active
                    && cage.current_cycle.is_some()
                    && cage.current_cycle == record.cycle;
                if !same_cycle {
                    return Err(FarmError::Conflict(format!(
                        "cage {} is no longer in the cycle this top-up was requested for",
                        cage.name
                    )));
                }
                self.ensure_room(&cage, record.fish_count, FarmError::Conflict)?;
            }
        }

        record.status = StockingStatus::Approved;
        record.reviewed_by = Some(actor.id().clone());
        record.reviewed_on = Some(today);
        self.repository.update_stocking(record.clone())?;

        cage.updated_on = today;
        self.repository.update_cage(cage.clone())?;

        info!(
            stocking_id = %record.id,
            cage_id = %cage.id,
            kind = record.kind.label(),
            fish = record.fish_count,
            approved_by = %actor.id(),
            "stocking approved"
        );
        Ok(record)
    }

    pub fn reject_stocking(
        &self,
        actor: &Actor,
        stocking_id: &StockingId,
        reason: &str,
    ) -> Result<StockingRecord, FarmError> {
        actor.require(Permission::ApproveStocking)?;
        let reason = required_text(reason, "rejection reason")?;
        let mut record = self.pending_request(actor, stocking_id)?;

        record.status = StockingStatus::Rejected;
        record.reviewed_by = Some(actor.id().clone());
        record.reviewed_on = Some(self.today());
        record.rejection_reason = Some(reason);
        self.repository.update_stocking(record.clone())?;

        warn!(stocking_id = %record.id, cage_id = %record.cage_id, rejected_by = %actor.id(), "stocking rejected");
        Ok(record)
    }

    /// Requests awaiting review in the actor's scope, oldest first.
    pub fn pending_approvals(&self, actor: &Actor) -> Result<Vec<StockingRecord>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let mut pending = self.repository.pending_stockings(actor.scope())?;
        pending.sort_by(|a, b| {
            a.requested_on
                .cmp(&b.requested_on)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(pending)
    }

    /// Every request ever made for a cage, newest stocking date first.
    pub fn stocking_history(
        &self,
        actor: &Actor,
        cage_id: &CageId,
    ) -> Result<Vec<StockingRecord>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        let mut history = self.repository.stockings_for_cage(&cage.id)?;
        history.sort_by(|a, b| {
            b.stocking_date
                .cmp(&a.stocking_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(history)
    }

    fn validate_request(&self, request: &StockingRequest) -> Result<(), FarmError> {
        positive_count(request.fish_count, "fish_count")?;
        positive_amount(request.average_weight_g, "average_weight_g")?;
        if request.stocking_date > self.today() {
            return Err(FarmError::Validation(format!(
                "stocking date {} is in the future",
                request.stocking_date
            )));
        }
        Ok(())
    }

    /// Room in the running cycle for `additional` fish; failures are built
    /// with `reject`.
    fn ensure_room(
        &self,
        cage: &Cage,
        additional: u32,
        reject: fn(String) -> FarmError,
    ) -> Result<(), FarmError> {
        let ledger = self.ledger(cage)?;
        if ledger.stocked_count().checked_add(additional).is_none() {
            return Err(reject(format!(
                "{additional} more fish would overflow the stock count of cage {}",
                cage.name
            )));
        }

        let Some(capacity) = cage.capacity else {
            return Ok(());
        };
        let stock = ledger.current_stock();
        if stock.saturating_add(additional) > capacity {
            return Err(reject(format!(
                "{additional} more fish would exceed the cage capacity of {capacity} ({stock} stocked)"
            )));
        }
        Ok(())
    }

    fn pending_request(
        &self,
        actor: &Actor,
        stocking_id: &StockingId,
    ) -> Result<StockingRecord, FarmError> {
        let record = self
            .repository
            .fetch_stocking(stocking_id)?
            .ok_or_else(|| FarmError::not_found("stocking", stocking_id))?;
        actor.require_company(&record.company_id)?;
        if !record.is_pending() {
            return Err(FarmError::Conflict(format!(
                "stocking {} has already been {}",
                record.id,
                record.status.label()
            )));
        }
        Ok(record)
    }

    fn insert_request(
        &self,
        actor: &Actor,
        cage: &Cage,
        kind: StockingKind,
        cycle: Option<StockingId>,
        request: StockingRequest,
    ) -> Result<StockingRecord, FarmError> {
        let species = optional_text(request.species).or_else(|| match kind {
            StockingKind::TopUp => cage.species.clone(),
            StockingKind::Initial => None,
        });

        let record = self.repository.insert_stocking(StockingRecord {
            id: StockingId(next_id(&STOCKING_SEQUENCE, "stk")),
            cage_id: cage.id.clone(),
            company_id: cage.company_id.clone(),
            kind,
            cycle,
            fish_count: request.fish_count,
            average_weight_g: request.average_weight_g,
            species,
            source: optional_text(request.source),
            stocking_date: request.stocking_date,
            status: StockingStatus::PendingApproval,
            requested_by: actor.id().clone(),
            requested_on: self.today(),
            reviewed_by: None,
            reviewed_on: None,
            rejection_reason: None,
            notes: optional_text(request.notes),
        })?;

        info!(
            stocking_id = %record.id,
            cage_id = %cage.id,
            kind = kind.label(),
            requested_by = %actor.id(),
            "stocking requested"
        );
        Ok(record)
    }
}
