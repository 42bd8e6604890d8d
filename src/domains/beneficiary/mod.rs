pub mod types;
pub mod repository;
pub mod service;

pub use types::{
    Beneficiary, NewBeneficiary, UpdateBeneficiary, BeneficiaryFilter, BeneficiaryWithDetails,
    BeneficiarySearchResult, BeneficiaryRow
};
pub use repository::{BeneficiaryRepository, SqliteBeneficiaryRepository};
pub use service::{BeneficiaryService, BeneficiaryServiceImpl};
