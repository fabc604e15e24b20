mod dashboard;
pub mod views;

pub use dashboard::CageSnapshot;
pub use views::DashboardReport;
