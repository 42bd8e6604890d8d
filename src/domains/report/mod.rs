pub mod types;
pub mod service;
pub mod writer;

pub use types::{Report, ReportFilters, ReportKind, ReportTable};
pub use service::{ReportService, ReportServiceImpl};
pub use writer::{write_csv, to_csv_string};
