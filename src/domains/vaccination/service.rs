use crate::auth::AuthContext;
use crate::domains::beneficiary::BeneficiaryRepository;
use crate::domains::reference::ReferenceDataRepository;
use crate::domains::vaccination::repository::VaccinationRepository;
use crate::domains::vaccination::types::{
    NewVaccination, Vaccination, VaccinationJoin, VaccinationQuery, VaccinationRecord,
};
use crate::errors::{DomainError, ServiceResult, ValidationError};
use crate::types::{PaginatedResult, PaginationParams};
use crate::validation::Validate;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Trait defining vaccination service operations
#[async_trait]
pub trait VaccinationService: Send + Sync {
    async fn record_vaccination(
        &self,
        new_vaccination: NewVaccination,
        auth: &AuthContext,
        today: NaiveDate,
    ) -> ServiceResult<Vaccination>;

    async fn get_vaccination(&self, id: Uuid) -> ServiceResult<VaccinationRecord>;

    async fn list_vaccinations(
        &self,
        filter: VaccinationQuery,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<VaccinationRecord>>;

    /// Vaccinations are leaf records, so this never checks dependencies.
    async fn delete_vaccination(&self, id: Uuid) -> ServiceResult<()>;
}

/// Implementation of the vaccination service
#[derive(Clone)]
pub struct VaccinationServiceImpl {
    repo: Arc<dyn VaccinationRepository>,
    beneficiary_repo: Arc<dyn BeneficiaryRepository>,
    reference_repo: Arc<dyn ReferenceDataRepository>,
}

impl VaccinationServiceImpl {
    pub fn new(
        repo: Arc<dyn VaccinationRepository>,
        beneficiary_repo: Arc<dyn BeneficiaryRepository>,
        reference_repo: Arc<dyn ReferenceDataRepository>,
    ) -> Self {
        Self {
            repo,
            beneficiary_repo,
            reference_repo,
        }
    }
}

/// Turn a missing referenced record into a validation failure on `field`.
fn missing_reference(err: DomainError, field: &str, reason: &str) -> DomainError {
    match err {
        DomainError::EntityNotFound(_, _) => {
            DomainError::Validation(ValidationError::invalid_value(field, reason))
        }
        other => other,
    }
}

#[async_trait]
impl VaccinationService for VaccinationServiceImpl {
    async fn record_vaccination(
        &self,
        new_vaccination: NewVaccination,
        auth: &AuthContext,
        today: NaiveDate,
    ) -> ServiceResult<Vaccination> {
        // 1. Required fields, before any store call
        new_vaccination.validate()?;

        // 2. Series length and date rules need the vaccine
        let vaccine = self
            .reference_repo
            .find_vaccine_type(new_vaccination.vaccine_type_id)
            .await
            .map_err(|e| missing_reference(e, "vaccine_type_id", "must reference an existing vaccine"))?;
        new_vaccination.validate_against(&vaccine, today)?;

        // 3. Referenced beneficiary and place
        self.beneficiary_repo
            .find_by_id(new_vaccination.beneficiary_id)
            .await
            .map_err(|e| missing_reference(e, "beneficiary_id", "must reference an existing beneficiary"))?;
        self.reference_repo
            .find_district(new_vaccination.district_id)
            .await
            .map_err(|e| missing_reference(e, "district_id", "must reference an existing district"))?;

        // 4. Insert
        let vaccination = self.repo.create(&new_vaccination, auth).await?;
        log::info!(
            "Recorded dose {} of {} for beneficiary {}",
            vaccination.dose_number,
            vaccine.name,
            vaccination.beneficiary_id
        );
        Ok(vaccination)
    }

    async fn get_vaccination(&self, id: Uuid) -> ServiceResult<VaccinationRecord> {
        Ok(self.repo.find_record(id).await?)
    }

    async fn list_vaccinations(
        &self,
        filter: VaccinationQuery,
        params: PaginationParams,
    ) -> ServiceResult<PaginatedResult<VaccinationRecord>> {
        Ok(self
            .repo
            .find_by_filter(&filter, VaccinationJoin::all(), params)
            .await?)
    }

    async fn delete_vaccination(&self, id: Uuid) -> ServiceResult<()> {
        self.repo.hard_delete(id).await?;
        log::info!("Deleted vaccination {}", id);
        Ok(())
    }
}
