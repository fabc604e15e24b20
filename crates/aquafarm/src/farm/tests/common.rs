use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{AdminSeed, FarmConfig};
use crate::farm::access::Actor;
use crate::farm::domain::{
    Cage, CageId, Company, CompanyId, DailyRecord, GrowthSample, HarvestRecord, Profile,
    StockingId, StockingRecord, UserId, UserRole,
};
use crate::farm::repository::{
    CageRepository, CompanyRepository, OperationsRepository, ProfileRepository, RepositoryError,
    StockingRepository,
};
use crate::farm::requests::{
    CompanyRegistration, DailyRecordInput, NewCage, NewUser, SampleInput, StockingRequest,
};
use crate::farm::service::FarmService;
use crate::farm::store::InMemoryFarmStore;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 5, 1)
}

pub(super) fn stocking_day() -> NaiveDate {
    date(2025, 4, 1)
}

pub(super) fn build_service() -> (FarmService<InMemoryFarmStore>, Arc<InMemoryFarmStore>) {
    let store = Arc::new(InMemoryFarmStore::default());
    let service =
        FarmService::new(store.clone(), &FarmConfig::default()).with_clock(Arc::new(today));
    (service, store)
}

pub(super) fn registration(name: &str, manager_email: &str) -> CompanyRegistration {
    CompanyRegistration {
        company_name: name.to_string(),
        contact_email: "ops@bluelagoon.test".to_string(),
        manager_name: "Mara Santos".to_string(),
        manager_email: manager_email.to_string(),
    }
}

pub(super) fn stocking_request(fish_count: u32, average_weight_g: f64) -> StockingRequest {
    StockingRequest {
        fish_count,
        average_weight_g,
        stocking_date: stocking_day(),
        species: Some("Tilapia".to_string()),
        source: Some("Hatchery A".to_string()),
        notes: None,
    }
}

pub(super) fn daily(day: NaiveDate, feed_kg: f64, mortality: u32) -> DailyRecordInput {
    DailyRecordInput {
        date: day,
        feed_kg,
        feed_type: Some("Grower 3mm".to_string()),
        mortality,
        water_temp_c: Some(28.0),
        dissolved_oxygen_mg_l: Some(5.5),
        notes: None,
    }
}

pub(super) fn sample(day: NaiveDate, sample_count: u32, sample_weight_kg: f64) -> SampleInput {
    SampleInput {
        date: day,
        sample_count,
        sample_weight_kg,
        notes: None,
    }
}

/// One approved company with a user for every role.
pub(super) struct FarmFixture {
    pub(super) service: Arc<FarmService<InMemoryFarmStore>>,
    pub(super) store: Arc<InMemoryFarmStore>,
    pub(super) admin: Actor,
    pub(super) company_id: CompanyId,
    pub(super) manager: Actor,
    pub(super) operator: Actor,
    pub(super) viewer: Actor,
}

impl FarmFixture {
    pub(super) fn new() -> Self {
        let (service, store) = build_service();

        let admin = service
            .bootstrap_admin(&AdminSeed {
                full_name: "Platform Admin".to_string(),
                email: "admin@aquafarm.test".to_string(),
            })
            .expect("admin seeded");
        let admin = service.authenticate(&admin.id).expect("admin signs in");

        let receipt = service
            .register_company(registration("Blue Lagoon Aquaculture", "mara@bluelagoon.test"))
            .expect("company registered");
        service
            .approve_company(&admin, &receipt.company.id)
            .expect("company approved");
        let manager = service
            .authenticate(&receipt.manager.id)
            .expect("manager signs in");

        let operator = Self::member(
            &service,
            &manager,
            "Ike Tan",
            "ike@bluelagoon.test",
            UserRole::Operator,
        );
        let viewer = Self::member(
            &service,
            &manager,
            "Vera Lim",
            "vera@bluelagoon.test",
            UserRole::Viewer,
        );

        Self {
            service: Arc::new(service),
            store,
            admin,
            company_id: receipt.company.id,
            manager,
            operator,
            viewer,
        }
    }

    fn member(
        service: &FarmService<InMemoryFarmStore>,
        manager: &Actor,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Actor {
        let profile = service
            .create_user(
                manager,
                NewUser {
                    full_name: name.to_string(),
                    email: email.to_string(),
                    role,
                    company_id: None,
                },
            )
            .expect("user created");
        service.authenticate(&profile.id).expect("user signs in")
    }

    pub(super) fn cage(&self, name: &str, capacity: Option<u32>) -> Cage {
        self.service
            .create_cage(
                &self.manager,
                NewCage {
                    name: name.to_string(),
                    location: Some("North pen".to_string()),
                    volume_m3: Some(100.0),
                    capacity,
                    company_id: None,
                },
            )
            .expect("cage created")
    }

    /// Cage stocked on [`stocking_day`] through the request/approve flow.
    pub(super) fn stocked_cage(&self, name: &str, fish_count: u32, average_weight_g: f64) -> Cage {
        let cage = self.cage(name, None);
        let request = self
            .service
            .request_stocking(
                &self.operator,
                &cage.id,
                stocking_request(fish_count, average_weight_g),
            )
            .expect("stocking requested");
        self.service
            .approve_stocking(&self.manager, &request.id)
            .expect("stocking approved");
        self.service
            .get_cage(&self.manager, &cage.id)
            .expect("cage reloads")
    }

    pub(super) fn router(&self) -> axum::Router {
        crate::farm::farm_router(self.service.clone())
    }
}

/// Repository whose backing store is always down.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl CompanyRepository for UnavailableStore {
    fn insert_company(&self, _company: Company) -> Result<Company, RepositoryError> {
        offline()
    }

    fn update_company(&self, _company: Company) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_company(&self, _id: &CompanyId) -> Result<Option<Company>, RepositoryError> {
        offline()
    }

    fn companies(&self) -> Result<Vec<Company>, RepositoryError> {
        offline()
    }
}

impl ProfileRepository for UnavailableStore {
    fn insert_profile(&self, _profile: Profile) -> Result<Profile, RepositoryError> {
        offline()
    }

    fn update_profile(&self, _profile: Profile) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_profile(&self, _id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn profiles(&self, _company: Option<&CompanyId>) -> Result<Vec<Profile>, RepositoryError> {
        offline()
    }
}

impl CageRepository for UnavailableStore {
    fn insert_cage(&self, _cage: Cage) -> Result<Cage, RepositoryError> {
        offline()
    }

    fn update_cage(&self, _cage: Cage) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_cage(&self, _id: &CageId) -> Result<Option<Cage>, RepositoryError> {
        offline()
    }

    fn remove_cage(&self, _id: &CageId) -> Result<(), RepositoryError> {
        offline()
    }

    fn cages(&self, _company: Option<&CompanyId>) -> Result<Vec<Cage>, RepositoryError> {
        offline()
    }
}

impl StockingRepository for UnavailableStore {
    fn insert_stocking(&self, _record: StockingRecord) -> Result<StockingRecord, RepositoryError> {
        offline()
    }

    fn update_stocking(&self, _record: StockingRecord) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_stocking(&self, _id: &StockingId) -> Result<Option<StockingRecord>, RepositoryError> {
        offline()
    }

    fn stockings_for_cage(&self, _cage: &CageId) -> Result<Vec<StockingRecord>, RepositoryError> {
        offline()
    }

    fn pending_stockings(
        &self,
        _company: Option<&CompanyId>,
    ) -> Result<Vec<StockingRecord>, RepositoryError> {
        offline()
    }
}

impl OperationsRepository for UnavailableStore {
    fn insert_daily(&self, _record: DailyRecord) -> Result<DailyRecord, RepositoryError> {
        offline()
    }

    fn daily_records(
        &self,
        _cage: &CageId,
        _cycle: &StockingId,
    ) -> Result<Vec<DailyRecord>, RepositoryError> {
        offline()
    }

    fn insert_sample(&self, _sample: GrowthSample) -> Result<GrowthSample, RepositoryError> {
        offline()
    }

    fn samples(
        &self,
        _cage: &CageId,
        _cycle: &StockingId,
    ) -> Result<Vec<GrowthSample>, RepositoryError> {
        offline()
    }

    fn insert_harvest(&self, _record: HarvestRecord) -> Result<HarvestRecord, RepositoryError> {
        offline()
    }

    fn harvests(
        &self,
        _cage: &CageId,
        _cycle: &StockingId,
    ) -> Result<Vec<HarvestRecord>, RepositoryError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
