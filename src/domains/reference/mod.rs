pub mod types;
pub mod repository;

pub use types::{
    District, Block, VaccineType, NewDistrict, NewBlock, NewVaccineType,
    DistrictRow, BlockRow, VaccineTypeRow
};
pub use repository::{ReferenceDataRepository, SqliteReferenceDataRepository};
