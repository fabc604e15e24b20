//! Fish-farm operations: companies, users, cage inventory, stocking approvals,
//! daily feeding logs, growth sampling, harvests and the reporting built on
//! top of them.

pub mod access;
pub mod domain;
pub mod feed_log;
pub mod metrics;
pub mod report;
pub mod repository;
pub mod requests;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use access::{AccessError, Actor, Permission};
pub use domain::{
    Cage, CageId, CageStatus, Company, CompanyId, CompanyStatus, DailyRecord, GrowthSample,
    HarvestKind, HarvestRecord, Profile, RecordId, StockingId, StockingKind, StockingRecord,
    StockingStatus, UserId, UserRole,
};
pub use feed_log::{FeedLogError, FeedLogImport, RejectedRow};
pub use metrics::{CycleLedger, CycleMetrics, GrowthPoint};
pub use report::DashboardReport;
pub use repository::{FarmRepository, RepositoryError};
pub use requests::{
    CageQuery, CageSort, CageUpdate, CompanyRegistration, CompanyRegistrationReceipt,
    DailyRecordInput, HarvestInput, NewCage, NewUser, SampleInput, SortOrder, StockingRequest,
};
pub use router::farm_router;
pub use service::{CageOverview, Clock, FarmError, FarmService};
pub use store::InMemoryFarmStore;
