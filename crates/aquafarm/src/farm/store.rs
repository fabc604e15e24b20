use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Cage, CageId, Company, CompanyId, DailyRecord, GrowthSample, HarvestRecord, Profile,
    RecordId, StockingId, StockingRecord, UserId,
};
use super::repository::{
    CageRepository, CompanyRepository, OperationsRepository, ProfileRepository, RepositoryError,
    StockingRepository,
};

#[derive(Debug, Default)]
struct FarmTables {
    companies: BTreeMap<CompanyId, Company>,
    profiles: BTreeMap<UserId, Profile>,
    cages: BTreeMap<CageId, Cage>,
    stockings: BTreeMap<StockingId, StockingRecord>,
    daily: BTreeMap<RecordId, DailyRecord>,
    samples: BTreeMap<RecordId, GrowthSample>,
    harvests: BTreeMap<RecordId, HarvestRecord>,
}

/// Process-local store backing every repository trait.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFarmStore {
    tables: Arc<Mutex<FarmTables>>,
}

impl InMemoryFarmStore {
    fn tables(&self) -> Result<MutexGuard<'_, FarmTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("farm store lock poisoned".to_string()))
    }
}

fn insert_new<K: Ord + Clone, V: Clone>(
    table: &mut BTreeMap<K, V>,
    key: &K,
    value: V,
) -> Result<V, RepositoryError> {
    if table.contains_key(key) {
        return Err(RepositoryError::Conflict);
    }
    table.insert(key.clone(), value.clone());
    Ok(value)
}

fn replace_existing<K: Ord + Clone, V>(
    table: &mut BTreeMap<K, V>,
    key: &K,
    value: V,
) -> Result<(), RepositoryError> {
    match table.get_mut(key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(RepositoryError::NotFound),
    }
}

impl CompanyRepository for InMemoryFarmStore {
    fn insert_company(&self, company: Company) -> Result<Company, RepositoryError> {
        let key = company.id.clone();
        insert_new(&mut self.tables()?.companies, &key, company)
    }

    fn update_company(&self, company: Company) -> Result<(), RepositoryError> {
        let key = company.id.clone();
        replace_existing(&mut self.tables()?.companies, &key, company)
    }

    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables()?.companies.get(id).cloned())
    }

    fn companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self.tables()?.companies.values().cloned().collect())
    }
}

impl ProfileRepository for InMemoryFarmStore {
    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        let key = profile.id.clone();
        insert_new(&mut self.tables()?.profiles, &key, profile)
    }

    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        let key = profile.id.clone();
        replace_existing(&mut self.tables()?.profiles, &key, profile)
    }

    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables()?.profiles.get(id).cloned())
    }

    fn profiles(&self, company: Option<&CompanyId>) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self
            .tables()?
            .profiles
            .values()
            .filter(|profile| company.map_or(true, |id| profile.company_id.as_ref() == Some(id)))
            .cloned()
            .collect())
    }
}

impl CageRepository for InMemoryFarmStore {
    fn insert_cage(&self, cage: Cage) -> Result<Cage, RepositoryError> {
        let key = cage.id.clone();
        insert_new(&mut self.tables()?.cages, &key, cage)
    }

    fn update_cage(&self, cage: Cage) -> Result<(), RepositoryError> {
        let key = cage.id.clone();
        replace_existing(&mut self.tables()?.cages, &key, cage)
    }

    fn fetch_cage(&self, id: &CageId) -> Result<Option<Cage>, RepositoryError> {
        Ok(self.tables()?.cages.get(id).cloned())
    }

    fn remove_cage(&self, id: &CageId) -> Result<(), RepositoryError> {
        self.tables()?
            .cages
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn cages(&self, company: Option<&CompanyId>) -> Result<Vec<Cage>, RepositoryError> {
        Ok(self
            .tables()?
            .cages
            .values()
            .filter(|cage| company.map_or(true, |id| &cage.company_id == id))
            .cloned()
            .collect())
    }
}

impl StockingRepository for InMemoryFarmStore {
    fn insert_stocking(&self, record: StockingRecord) -> Result<StockingRecord, RepositoryError> {
        let key = record.id.clone();
        insert_new(&mut self.tables()?.stockings, &key, record)
    }

    fn update_stocking(&self, record: StockingRecord) -> Result<(), RepositoryError> {
        let key = record.id.clone();
        replace_existing(&mut self.tables()?.stockings, &key, record)
    }

    fn fetch_stocking(&self, id: &StockingId) -> Result<Option<StockingRecord>, RepositoryError> {
        Ok(self.tables()?.stockings.get(id).cloned())
    }

    fn stockings_for_cage(&self, cage: &CageId) -> Result<Vec<StockingRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .stockings
            .values()
            .filter(|record| &record.cage_id == cage)
            .cloned()
            .collect())
    }

    fn pending_stockings(
        &self,
        company: Option<&CompanyId>,
    ) -> Result<Vec<StockingRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .stockings
            .values()
            .filter(|record| record.is_pending())
            .filter(|record| company.map_or(true, |id| &record.company_id == id))
            .cloned()
            .collect())
    }
}

impl OperationsRepository for InMemoryFarmStore {
    fn insert_daily(&self, record: DailyRecord) -> Result<DailyRecord, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate_day = tables.daily.values().any(|existing| {
            existing.cage_id == record.cage_id
                && existing.cycle == record.cycle
                && existing.date == record.date
        });
        if duplicate_day {
            return Err(RepositoryError::Conflict);
        }
        let key = record.id.clone();
        insert_new(&mut tables.daily, &key, record)
    }

    fn daily_records(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<DailyRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .daily
            .values()
            .filter(|record| &record.cage_id == cage && &record.cycle == cycle)
            .cloned()
            .collect())
    }

    fn insert_sample(&self, sample: GrowthSample) -> Result<GrowthSample, RepositoryError> {
        let key = sample.id.clone();
        insert_new(&mut self.tables()?.samples, &key, sample)
    }

    fn samples(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<GrowthSample>, RepositoryError> {
        Ok(self
            .tables()?
            .samples
            .values()
            .filter(|sample| &sample.cage_id == cage && &sample.cycle == cycle)
            .cloned()
            .collect())
    }

    fn insert_harvest(&self, record: HarvestRecord) -> Result<HarvestRecord, RepositoryError> {
        let key = record.id.clone();
        insert_new(&mut self.tables()?.harvests, &key, record)
    }

    fn harvests(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<HarvestRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .harvests
            .values()
            .filter(|record| &record.cage_id == cage && &record.cycle == cycle)
            .cloned()
            .collect())
    }
}
