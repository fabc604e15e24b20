use super::domain::{
    Cage, CageId, Company, CompanyId, DailyRecord, GrowthSample, HarvestRecord, Profile,
    StockingId, StockingRecord, UserId,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// `companies` table.
pub trait CompanyRepository: Send + Sync {
    fn insert_company(&self, company: Company) -> Result<Company, RepositoryError>;
    fn update_company(&self, company: Company) -> Result<(), RepositoryError>;
    fn fetch_company(&self, id: &CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn companies(&self) -> Result<Vec<Company>, RepositoryError>;
}

/// `profiles` table.
pub trait ProfileRepository: Send + Sync {
    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError>;
    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError>;
    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError>;
    /// All profiles, or only those of `company` when given.
    fn profiles(&self, company: Option<&CompanyId>) -> Result<Vec<Profile>, RepositoryError>;
}

/// `cages` table.
pub trait CageRepository: Send + Sync {
    fn insert_cage(&self, cage: Cage) -> Result<Cage, RepositoryError>;
    fn update_cage(&self, cage: Cage) -> Result<(), RepositoryError>;
    fn fetch_cage(&self, id: &CageId) -> Result<Option<Cage>, RepositoryError>;
    fn remove_cage(&self, id: &CageId) -> Result<(), RepositoryError>;
    fn cages(&self, company: Option<&CompanyId>) -> Result<Vec<Cage>, RepositoryError>;
}

/// `stocking_history` table.
pub trait StockingRepository: Send + Sync {
    fn insert_stocking(&self, record: StockingRecord) -> Result<StockingRecord, RepositoryError>;
    fn update_stocking(&self, record: StockingRecord) -> Result<(), RepositoryError>;
    fn fetch_stocking(&self, id: &StockingId) -> Result<Option<StockingRecord>, RepositoryError>;
    fn stockings_for_cage(&self, cage: &CageId) -> Result<Vec<StockingRecord>, RepositoryError>;
    fn pending_stockings(
        &self,
        company: Option<&CompanyId>,
    ) -> Result<Vec<StockingRecord>, RepositoryError>;
}

/// `daily_records`, `biweekly_records` and `harvest_records` tables, keyed by
/// cage and production cycle.
pub trait OperationsRepository: Send + Sync {
    fn insert_daily(&self, record: DailyRecord) -> Result<DailyRecord, RepositoryError>;
    fn daily_records(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<DailyRecord>, RepositoryError>;
    fn insert_sample(&self, sample: GrowthSample) -> Result<GrowthSample, RepositoryError>;
    fn samples(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<GrowthSample>, RepositoryError>;
    fn insert_harvest(&self, record: HarvestRecord) -> Result<HarvestRecord, RepositoryError>;
    fn harvests(
        &self,
        cage: &CageId,
        cycle: &StockingId,
    ) -> Result<Vec<HarvestRecord>, RepositoryError>;
}

/// Every table the farm service reads and writes.
pub trait FarmRepository:
    CompanyRepository + ProfileRepository + CageRepository + StockingRepository + OperationsRepository
{
}

impl<T> FarmRepository for T where
    T: CompanyRepository
        + ProfileRepository
        + CageRepository
        + StockingRepository
        + OperationsRepository
{
}
