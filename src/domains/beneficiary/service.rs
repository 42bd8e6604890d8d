use crate::auth::AuthContext;
use crate::domains::beneficiary::repository::BeneficiaryRepository;
use crate::domains::beneficiary::types::{
    Beneficiary, BeneficiaryFilter, BeneficiarySearchResult, BeneficiaryWithDetails,
    NewBeneficiary, UpdateBeneficiary,
};
use crate::domains::core::dependency_checker::DependencyChecker;
use crate::domains::reference::ReferenceDataRepository;
use crate::errors::{DomainError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams};
use crate::validation::Validate;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

pub const SEARCH_LIMIT: u32 = 20;

/// Trait defining beneficiary service operations
#[async_trait]
pub trait BeneficiaryService: Send + Sync {
    async fn create_beneficiary(
        &self,
        new_beneficiary: NewBeneficiary,
        auth: &AuthContext,
        today: NaiveDate,
    ) -> ServiceResult<Beneficiary>;

    async fn update_beneficiary(
        &self,
        id: Uuid,
        update_data: UpdateBeneficiary,
        today: NaiveDate,
    ) -> ServiceResult<Beneficiary>;

    async fn get_beneficiary(&self, id: Uuid) -> ServiceResult<Beneficiary>;

    async fn list_beneficiaries(
        &self,
        filter: BeneficiaryFilter,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<BeneficiaryWithDetails>>;

    async fn search_beneficiaries(&self, term: &str) -> ServiceResult<Vec<BeneficiarySearchResult>>;

    /// Deletes only when no vaccination references the beneficiary.
    async fn delete_beneficiary(&self, id: Uuid) -> ServiceResult<()>;
}

/// Implementation of the beneficiary service
#[derive(Clone)]
pub struct BeneficiaryServiceImpl {
    repo: Arc<dyn BeneficiaryRepository>,
    reference_repo: Arc<dyn ReferenceDataRepository>,
    dependency_checker: Arc<dyn DependencyChecker>,
}

impl BeneficiaryServiceImpl {
    pub fn new(
        repo: Arc<dyn BeneficiaryRepository>,
        reference_repo: Arc<dyn ReferenceDataRepository>,
        dependency_checker: Arc<dyn DependencyChecker>,
    ) -> Self {
        Self {
            repo,
            reference_repo,
            dependency_checker,
        }
    }

    /// The district must exist and the block, if any, must lie inside it.
    async fn validate_location(&self, district_id: Uuid, block_id: Option<Uuid>) -> ServiceResult<()> {
        match self.reference_repo.find_district(district_id).await {
            Ok(_) => {}
            Err(DomainError::EntityNotFound(_, _)) => {
                return Err(ValidationError::invalid_value(
                    "district_id",
                    "must reference an existing district",
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(block_id) = block_id {
            let blocks = self.reference_repo.get_blocks(Some(district_id)).await?;
            if !blocks.iter().any(|b| b.id == block_id) {
                return Err(ValidationError::invalid_value(
                    "block_id",
                    "must be a block of the selected district",
                )
                .into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BeneficiaryService for BeneficiaryServiceImpl {
    async fn create_beneficiary(
        &self,
        new_beneficiary: NewBeneficiary,
        auth: &AuthContext,
        today: NaiveDate,
    ) -> ServiceResult<Beneficiary> {
        // 1. Field validation, before any store call
        new_beneficiary.validate_for(today)?;

        // 2. Reference checks
        self.validate_location(new_beneficiary.district_id, new_beneficiary.block_id)
            .await?;

        // 3. Insert
        let beneficiary = self.repo.create(&new_beneficiary, auth).await?;
        log::info!("Registered beneficiary {} in district {}", beneficiary.id, beneficiary.district_id);
        Ok(beneficiary)
    }

    async fn update_beneficiary(
        &self,
        id: Uuid,
        update_data: UpdateBeneficiary,
        today: NaiveDate,
    ) -> ServiceResult<Beneficiary> {
        update_data.validate_for(today)?;

        if update_data.district_id.is_some() || update_data.block_id.is_some() {
            let current = self.repo.find_by_id(id).await?;
            let district_id = update_data.district_id.unwrap_or(current.district_id);
            let block_id = update_data.block_id.or(current.block_id);
            self.validate_location(district_id, block_id).await?;
        }

        Ok(self.repo.update(id, &update_data).await?)
    }

    async fn get_beneficiary(&self, id: Uuid) -> ServiceResult<Beneficiary> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn list_beneficiaries(
        &self,
        filter: BeneficiaryFilter,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<BeneficiaryWithDetails>> {
        filter.validate()?;
        Ok(self.repo.find_with_details(&filter, params).await?)
    }

    async fn search_beneficiaries(&self, term: &str) -> ServiceResult<Vec<BeneficiarySearchResult>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search_by_name(term, SEARCH_LIMIT).await?)
    }

    async fn delete_beneficiary(&self, id: Uuid) -> ServiceResult<()> {
        // 1. Make sure it exists
        self.repo.find_by_id(id).await?;

        // 2. Referencing vaccinations block the delete
        let table_name = self.repo.entity_name();
        let blocking = self.dependency_checker.get_blocking_tables(table_name, id).await?;
        if !blocking.is_empty() {
            log::warn!("Refusing to delete beneficiary {}: referenced by {}", id, blocking.join(", "));
            return Err(DomainError::DependentRecordsExist {
                entity_type: "beneficiary".to_string(),
                id,
                dependencies: blocking,
            }
            .into());
        }

        // 3. Delete
        self.repo.hard_delete(id).await?;
        log::info!("Deleted beneficiary {}", id);
        Ok(())
    }
}
