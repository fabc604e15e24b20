use chrono::NaiveDate;
use serde::Serialize;

use crate::farm::domain::{CageId, CageStatus, HarvestKind};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: CageStatus,
    pub status_label: &'static str,
    pub count: usize,
}

/// One line of the dashboard cage table.
#[derive(Debug, Clone, Serialize)]
pub struct CageRow {
    pub cage_id: CageId,
    pub name: String,
    pub status: CageStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_culture: Option<i64>,
    pub fish: u32,
    pub biomass_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abw_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_daily_record: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestEntry {
    pub cage_id: CageId,
    pub cage_name: String,
    pub date: NaiveDate,
    pub kind: HarvestKind,
    pub fish_count: u32,
    pub total_weight_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FarmAlert {
    pub cage_id: CageId,
    pub cage_name: String,
    pub topic: &'static str,
    pub detail: String,
    pub severity: AlertSeverity,
    pub severity_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub today: NaiveDate,
    pub window_days: u32,
    pub status_counts: Vec<StatusCount>,
    pub active_cages: usize,
    pub total_fish: u64,
    pub total_biomass_kg: f64,
    pub total_feed_kg: f64,
    pub recent_feed_kg: f64,
    pub recent_mortality: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_fcr: Option<f64>,
    pub pending_approvals: usize,
    pub recent_harvests: Vec<HarvestEntry>,
    pub cages: Vec<CageRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<FarmAlert>,
}
