pub mod types;
pub mod repository;
pub mod service;

pub use types::{
    Vaccination, NewVaccination, VaccinationQuery, VaccinationJoin, VaccinationRecord,
    VaccinationRecordRow
};
pub use repository::{VaccinationRepository, SqliteVaccinationRepository};
pub use service::{VaccinationService, VaccinationServiceImpl};
