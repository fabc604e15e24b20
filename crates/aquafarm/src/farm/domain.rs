use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a registered farming company.
    CompanyId
);
string_id!(
    /// Identifier of a user profile.
    UserId
);
string_id!(
    /// Identifier of a physical cage.
    CageId
);
string_id!(
    /// Identifier of a stocking or top-up request. An approved initial stocking
    /// doubles as the id of the production cycle it opened.
    StockingId
);
string_id!(
    /// Identifier shared by daily, sampling and harvest records.
    RecordId
);

/// Lifecycle of a cage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CageStatus {
    Empty,
    Active,
    Harvesting,
    Harvested,
    Maintenance,
    Fallow,
}

impl CageStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Empty,
            Self::Active,
            Self::Harvesting,
            Self::Harvested,
            Self::Maintenance,
            Self::Fallow,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Active => "Active",
            Self::Harvesting => "Harvesting",
            Self::Harvested => "Harvested",
            Self::Maintenance => "Maintenance",
            Self::Fallow => "Fallow",
        }
    }

    /// Transitions an operator may request directly. `Active` is only reached by
    /// approving an initial stocking.
    pub fn can_transition_to(self, next: CageStatus) -> bool {
        use CageStatus::*;
        matches!(
            (self, next),
            (Empty, Maintenance)
                | (Empty, Fallow)
                | (Active, Harvesting)
                | (Harvesting, Active)
                | (Harvesting, Harvested)
                | (Harvested, Empty)
                | (Harvested, Fallow)
                | (Harvested, Maintenance)
                | (Maintenance, Empty)
                | (Maintenance, Fallow)
                | (Fallow, Empty)
                | (Fallow, Maintenance)
        )
    }

    /// Cage can receive an initial stocking.
    pub const fn is_stockable(self) -> bool {
        matches!(self, Self::Empty | Self::Fallow)
    }

    /// Cage currently holds fish and accepts operational records.
    pub const fn holds_stock(self) -> bool {
        matches!(self, Self::Active | Self::Harvesting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockingKind {
    Initial,
    TopUp,
}

impl StockingKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "Initial stocking",
            Self::TopUp => "Top-up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockingStatus {
    PendingApproval,
    Approved,
    Rejected,
}

impl StockingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Approved,
    Rejected,
}

impl CompanyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Operator,
    Viewer,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Manager => "Farm Manager",
            Self::Operator => "Operator",
            Self::Viewer => "Viewer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestKind {
    Partial,
    Full,
}

/// Company registered on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub contact_email: String,
    pub status: CompanyStatus,
    pub registered_on: NaiveDate,
    pub reviewed_by: Option<UserId>,
    pub reviewed_on: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
}

/// User profile. Platform administrators carry no company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub company_id: Option<CompanyId>,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    pub created_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cage {
    pub id: CageId,
    pub company_id: CompanyId,
    pub name: String,
    pub location: Option<String>,
    pub volume_m3: Option<f64>,
    pub capacity: Option<u32>,
    pub status: CageStatus,
    pub current_cycle: Option<StockingId>,
    pub stocking_date: Option<NaiveDate>,
    pub species: Option<String>,
    pub created_on: NaiveDate,
    pub updated_on: NaiveDate,
}

/// Stocking or top-up request and its review trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockingRecord {
    pub id: StockingId,
    pub cage_id: CageId,
    pub company_id: CompanyId,
    pub kind: StockingKind,
    /// Cycle the fish belong to; set on approval for initial stockings.
    pub cycle: Option<StockingId>,
    pub fish_count: u32,
    pub average_weight_g: f64,
    pub species: Option<String>,
    pub source: Option<String>,
    pub stocking_date: NaiveDate,
    pub status: StockingStatus,
    pub requested_by: UserId,
    pub requested_on: NaiveDate,
    pub reviewed_by: Option<UserId>,
    pub reviewed_on: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

impl StockingRecord {
    pub fn biomass_kg(&self) -> f64 {
        f64::from(self.fish_count) * self.average_weight_g / 1000.0
    }

    pub fn is_pending(&self) -> bool {
        self.status == StockingStatus::PendingApproval
    }
}

/// Daily feeding and water-quality log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub id: RecordId,
    pub cage_id: CageId,
    pub cycle: StockingId,
    pub date: NaiveDate,
    pub feed_kg: f64,
    pub feed_type: Option<String>,
    pub mortality: u32,
    pub water_temp_c: Option<f64>,
    pub dissolved_oxygen_mg_l: Option<f64>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
}

/// Biweekly growth sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSample {
    pub id: RecordId,
    pub cage_id: CageId,
    pub cycle: StockingId,
    pub date: NaiveDate,
    pub sample_count: u32,
    pub sample_weight_kg: f64,
    pub average_weight_g: f64,
    pub notes: Option<String>,
    pub recorded_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub id: RecordId,
    pub cage_id: CageId,
    pub cycle: StockingId,
    pub date: NaiveDate,
    pub kind: HarvestKind,
    pub fish_count: u32,
    pub total_weight_kg: f64,
    pub average_weight_g: f64,
    pub buyer: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: UserId,
}

/// Average body weight in grams for a sampled weight and count.
pub fn average_weight_g(total_weight_kg: f64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total_weight_kg * 1000.0 / f64::from(count)
}
