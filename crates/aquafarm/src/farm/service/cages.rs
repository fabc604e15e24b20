use std::cmp::Ordering;

use tracing::info;

use super::{
    next_id, optional_text, required_text, same_text, FarmError, FarmService, CAGE_SEQUENCE,
};
use crate::farm::access::{Actor, Permission};
use crate::farm::domain::{Cage, CageId, CageStatus, CompanyId, CompanyStatus};
use crate::farm::repository::FarmRepository;
use crate::farm::requests::{CageQuery, CageSort, CageUpdate, NewCage, SortOrder};

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    pub fn create_cage(&self, actor: &Actor, request: NewCage) -> Result<Cage, FarmError> {
        actor.require(Permission::ManageCages)?;
        let company_id = match (actor.scope(), request.company_id) {
            (Some(own), _) => own.clone(),
            (None, Some(company_id)) => company_id,
            (None, None) => {
                return Err(FarmError::Validation(
                    "company_id is required when an administrator creates a cage".to_string(),
                ))
            }
        };
        actor.require_company(&company_id)?;
        let company = self
            .repository
            .fetch_company(&company_id)?
            .ok_or_else(|| FarmError::not_found("company", &company_id))?;
        if company.status != CompanyStatus::Approved {
            return Err(FarmError::Conflict(format!(
                "company {} is not approved",
                company.id
            )));
        }

        let name = required_text(&request.name, "cage name")?;
        self.ensure_cage_name_available(&company_id, &name, None)?;
        let volume_m3 = validated_volume(request.volume_m3)?;
        let capacity = validated_capacity(request.capacity)?;

        let today = self.today();
        let cage = self.repository.insert_cage(Cage {
            id: CageId(next_id(&CAGE_SEQUENCE, "cage")),
            company_id,
            name,
            location: optional_text(request.location),
            volume_m3,
            capacity,
            status: CageStatus::Empty,
            current_cycle: None,
            stocking_date: None,
            species: None,
            created_on: today,
            updated_on: today,
        })?;

        info!(cage_id = %cage.id, cage = %cage.name, company_id = %cage.company_id, "cage created");
        Ok(cage)
    }

    pub fn update_cage(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        update: CageUpdate,
    ) -> Result<Cage, FarmError> {
        actor.require(Permission::ManageCages)?;
        let mut cage = self.cage_in_scope(actor, cage_id)?;

        if let Some(name) = update.name {
            let name = required_text(&name, "cage name")?;
            self.ensure_cage_name_available(&cage.company_id, &name, Some(&cage.id))?;
            cage.name = name;
        }
        if let Some(location) = update.location {
            cage.location = optional_text(Some(location));
        }
        if update.volume_m3.is_some() {
            cage.volume_m3 = validated_volume(update.volume_m3)?;
        }
        if update.capacity.is_some() {
            let capacity = validated_capacity(update.capacity)?;
            let stock = self.ledger(&cage)?.current_stock();
            if capacity.is_some_and(|capacity| capacity < stock) {
                return Err(FarmError::Validation(format!(
                    "capacity cannot be lower than the {stock} fish currently stocked"
                )));
            }
            cage.capacity = capacity;
        }

        cage.updated_on = self.today();
        self.repository.update_cage(cage.clone())?;
        Ok(cage)
    }

    /// Manual status change following the cage lifecycle.
    pub fn change_cage_status(
        &self,
        actor: &Actor,
        cage_id: &CageId,
        status: CageStatus,
    ) -> Result<Cage, FarmError> {
        actor.require(Permission::ManageCages)?;
        let mut cage = self.cage_in_scope(actor, cage_id)?;
        let previous = cage.status;

        if !previous.can_transition_to(status) {
            return Err(FarmError::InvalidTransition {
                from: previous,
                to: status,
            });
        }
        if status == CageStatus::Harvested {
            let stock = self.ledger(&cage)?.current_stock();
            if stock > 0 {
                return Err(FarmError::Conflict(format!(
                    "cage {} still holds {stock} fish; record a full harvest instead",
                    cage.name
                )));
            }
        }
        if previous == CageStatus::Harvested {
            cage.current_cycle = None;
            cage.stocking_date = None;
            cage.species = None;
        }

        cage.status = status;
        cage.updated_on = self.today();
        self.repository.update_cage(cage.clone())?;

        info!(
            cage_id = %cage.id,
            from = previous.label(),
            to = status.label(),
            changed_by = %actor.id(),
            "cage status changed"
        );
        Ok(cage)
    }

    /// Remove a cage that was never stocked.
    pub fn remove_cage(&self, actor: &Actor, cage_id: &CageId) -> Result<(), FarmError> {
        actor.require(Permission::ManageCages)?;
        let cage = self.cage_in_scope(actor, cage_id)?;
        if cage.status != CageStatus::Empty {
            return Err(FarmError::Conflict(format!(
                "only empty cages can be removed; {} is {}",
                cage.name,
                cage.status.label()
            )));
        }
        if !self.repository.stockings_for_cage(&cage.id)?.is_empty() {
            return Err(FarmError::Conflict(format!(
                "cage {} has stocking history and cannot be removed",
                cage.name
            )));
        }

        self.repository.remove_cage(&cage.id)?;
        info!(cage_id = %cage.id, removed_by = %actor.id(), "cage removed");
        Ok(())
    }

    pub fn get_cage(&self, actor: &Actor, cage_id: &CageId) -> Result<Cage, FarmError> {
        actor.require(Permission::ViewFarm)?;
        self.cage_in_scope(actor, cage_id)
    }

    pub fn list_cages(&self, actor: &Actor, query: &CageQuery) -> Result<Vec<Cage>, FarmError> {
        actor.require(Permission::ViewFarm)?;
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let mut cages: Vec<Cage> = self
            .repository
            .cages(actor.scope())?
            .into_iter()
            .filter(|cage| query.status.map_or(true, |status| cage.status == status))
            .filter(|cage| match &needle {
                Some(needle) => {
                    cage.name.to_lowercase().contains(needle)
                        || cage
                            .location
                            .as_deref()
                            .is_some_and(|location| location.to_lowercase().contains(needle))
                }
                None => true,
            })
            .collect();

        cages.sort_by(|a, b| {
            let ordering = compare_cages(a, b, query.sort);
            let ordering = match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });
        Ok(cages)
    }

    fn ensure_cage_name_available(
        &self,
        company_id: &CompanyId,
        name: &str,
        except: Option<&CageId>,
    ) -> Result<(), FarmError> {
        let taken = self
            .repository
            .cages(Some(company_id))?
            .iter()
            .any(|cage| Some(&cage.id) != except && same_text(&cage.name, name));
        if taken {
            return Err(FarmError::Conflict(format!(
                "a cage named '{name}' already exists"
            )));
        }
        Ok(())
    }
}

fn compare_cages(a: &Cage, b: &Cage, sort: CageSort) -> Ordering {
    match sort {
        CageSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        CageSort::Status => a.status.label().cmp(b.status.label()),
        CageSort::Created => a.created_on.cmp(&b.created_on),
        // Older stocking date means more days of culture; unstocked cages last.
        CageSort::Doc => match (a.stocking_date, b.stocking_date) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn validated_volume(volume: Option<f64>) -> Result<Option<f64>, FarmError> {
    match volume {
        Some(volume) if !(volume.is_finite() && volume > 0.0) => Err(FarmError::Validation(
            "volume_m3 must be greater than zero".to_string(),
        )),
        other => Ok(other),
    }
}

fn validated_capacity(capacity: Option<u32>) -> Result<Option<u32>, FarmError> {
    match capacity {
        Some(0) => Err(FarmError::Validation(
            "capacity must be greater than zero".to_string(),
        )),
        other => Ok(other),
    }
}
