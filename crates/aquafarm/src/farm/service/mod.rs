//! Service facade over the farm tables.
//!
//! Every operation takes the calling [`Actor`], checks its permission and
//! company scope, validates the request against the current table state and
//! only then writes through the repository.

mod cages;
mod companies;
mod operations;
mod reporting;
mod stocking;
mod users;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use super::access::{AccessError, Actor};
use super::domain::{Cage, CageId, CageStatus, CompanyStatus, UserId};
use super::feed_log::FeedLogError;
use super::metrics::CycleLedger;
use super::repository::{FarmRepository, RepositoryError};
use crate::config::FarmConfig;

pub use reporting::CageOverview;

/// Source of "today" for date validation and day-of-culture figures.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct FarmService<R> {
    repository: Arc<R>,
    clock: Clock,
    feed_window_days: u32,
}

static COMPANY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static STOCKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

impl<R> FarmService<R>
where
    R: FarmRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: &FarmConfig) -> Self {
        Self {
            repository,
            clock: Arc::new(|| Local::now().date_naive()),
            feed_window_days: config.feed_window_days,
        }
    }

    /// Replace the wall clock, mainly for reproducible reports and tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Resolve a caller id into an actor that may use the farm.
    pub fn authenticate(&self, user_id: &UserId) -> Result<Actor, FarmError> {
        let profile = self
            .repository
            .fetch_profile(user_id)?
            .ok_or(AccessError::Unauthenticated)?;

        if !profile.active {
            return Err(AccessError::Inactive.into());
        }

        if let Some(company_id) = &profile.company_id {
            let approved = self
                .repository
                .fetch_company(company_id)?
                .map(|company| company.status == CompanyStatus::Approved)
                .unwrap_or(false);
            if !approved {
                return Err(AccessError::CompanyNotApproved.into());
            }
        }

        Ok(Actor::new(profile))
    }

    /// Fetch a cage the actor is allowed to see.
    fn cage_in_scope(&self, actor: &Actor, cage_id: &CageId) -> Result<Cage, FarmError> {
        let cage = self
            .repository
            .fetch_cage(cage_id)?
            .ok_or_else(|| FarmError::not_found("cage", cage_id))?;
        actor.require_company(&cage.company_id)?;
        Ok(cage)
    }

    /// Records of the cage's current cycle; empty when the cage is not stocked.
    fn ledger(&self, cage: &Cage) -> Result<CycleLedger, FarmError> {
        let Some(cycle) = cage.current_cycle.clone() else {
            return Ok(CycleLedger::default());
        };

        let stockings = self.repository.stockings_for_cage(&cage.id)?;
        let daily = self.repository.daily_records(&cage.id, &cycle)?;
        let samples = self.repository.samples(&cage.id, &cycle)?;
        let harvests = self.repository.harvests(&cage.id, &cycle)?;
        Ok(CycleLedger::new(cycle, stockings, daily, samples, harvests))
    }
}

/// Error raised by the farm service.
#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("cage cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: CageStatus, to: CageStatus },
    #[error(transparent)]
    FeedLog(#[from] FeedLogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl FarmError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn required_text(value: &str, field: &str) -> Result<String, FarmError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FarmError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn required_email(value: &str, field: &str) -> Result<String, FarmError> {
    let email = required_text(value, field)?;
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid {
        return Err(FarmError::Validation(format!(
            "{field} must be a valid e-mail address"
        )));
    }
    Ok(email.to_lowercase())
}

/// Case-insensitive equality under Unicode lowercasing.
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn positive_amount(value: f64, field: &str) -> Result<f64, FarmError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FarmError::Validation(format!(
            "{field} must be greater than zero"
        )))
    }
}

fn positive_count(value: u32, field: &str) -> Result<u32, FarmError> {
    if value == 0 {
        return Err(FarmError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(value)
}
