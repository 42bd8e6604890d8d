pub mod types;
pub mod filter;
pub mod aggregation;
pub mod repository;
pub mod sequencer;
pub mod service;

pub use types::{
    DateRangePreset, FilterSelection, CanonicalFilter, DashboardSummary, TrendPoint,
    VaccineTypeStat, DistrictStat, AgeGroup, AgeGroupStat, RecentVaccination, Section,
    DashboardSnapshot, VaccineDoseSummary, DistrictCoverage, MonthlyActivity
};
pub use filter::{normalize, merge};
pub use repository::{AggregateViewRepository, SqliteAggregateViewRepository};
pub use sequencer::{RequestSequencer, RequestTicket};
pub use service::{DashboardService, DashboardServiceImpl};
