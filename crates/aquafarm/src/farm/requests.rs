use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CageStatus, Company, CompanyId, HarvestKind, Profile, UserRole};

/// Self-service company sign-up, submitted without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRegistration {
    pub company_name: String,
    pub contact_email: String,
    pub manager_name: String,
    pub manager_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyRegistrationReceipt {
    pub company: Company,
    pub manager: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    /// Required when an administrator creates a company user.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCage {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

/// Partial cage edit; absent fields are left untouched and an empty location
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CageUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CageSort {
    #[default]
    Name,
    Status,
    Doc,
    Created,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filter and ordering for cage listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CageQuery {
    #[serde(default)]
    pub status: Option<CageStatus>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: CageSort,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CageStatusChange {
    pub status: CageStatus,
}

/// Shared payload for initial stockings and top-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockingRequest {
    pub fish_count: u32,
    pub average_weight_g: f64,
    pub stocking_date: NaiveDate,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecordInput {
    pub date: NaiveDate,
    pub feed_kg: f64,
    #[serde(default)]
    pub feed_type: Option<String>,
    #[serde(default)]
    pub mortality: u32,
    #[serde(default)]
    pub water_temp_c: Option<f64>,
    #[serde(default)]
    pub dissolved_oxygen_mg_l: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleInput {
    pub date: NaiveDate,
    pub sample_count: u32,
    pub sample_weight_kg: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestInput {
    pub date: NaiveDate,
    pub kind: HarvestKind,
    pub fish_count: u32,
    pub total_weight_kg: f64,
    #[serde(default)]
    pub buyer: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChange {
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveChange {
    pub active: bool,
}
