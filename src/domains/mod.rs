pub mod core;
pub mod reference;
pub mod beneficiary;
pub mod vaccination;
pub mod dashboard;
pub mod report;

pub use beneficiary::{BeneficiaryService, BeneficiaryServiceImpl};
pub use dashboard::{DashboardService, DashboardServiceImpl};
pub use report::{ReportService, ReportServiceImpl};
pub use vaccination::{VaccinationService, VaccinationServiceImpl};
