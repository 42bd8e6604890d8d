use crate::domains::reference::VaccineType;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single administered dose. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccination {
    pub id: Uuid,
    pub beneficiary_id: Uuid,
    pub vaccine_type_id: Uuid,
    pub dose_number: i64,
    pub date_given: NaiveDate,
    /// Where the dose was given; may differ from the beneficiary's home district
    pub district_id: Uuid,
    pub block_id: Option<Uuid>,
    pub village: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub administered_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// NewVaccination DTO - used when recording a dose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVaccination {
    pub beneficiary_id: Uuid,
    pub vaccine_type_id: Uuid,
    pub dose_number: i64,
    pub date_given: NaiveDate,
    pub district_id: Uuid,
    pub block_id: Option<Uuid>,
    pub village: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
}

impl Validate for NewVaccination {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("beneficiary_id", Some(self.beneficiary_id))
            .not_nil()
            .validate()?;
        ValidationBuilder::new("vaccine_type_id", Some(self.vaccine_type_id))
            .not_nil()
            .validate()?;
        ValidationBuilder::new("district_id", Some(self.district_id))
            .not_nil()
            .validate()?;
        ValidationBuilder::new("dose_number", Some(self.dose_number))
            .range(1, i64::MAX)
            .validate()?;

        if let Some(batch) = &self.batch_number {
            ValidationBuilder::new("batch_number", Some(batch.clone()))
                .max_length(50)
                .validate()?;
        }
        if let Some(notes) = &self.notes {
            ValidationBuilder::new("notes", Some(notes.clone()))
                .max_length(500)
                .validate()?;
        }
        Ok(())
    }
}

impl NewVaccination {
    /// Rules that need the vaccine's series length and the current date.
    pub fn validate_against(&self, vaccine: &VaccineType, today: NaiveDate) -> DomainResult<()> {
        self.validate()?;

        if self.dose_number > vaccine.total_doses {
            return Err(DomainError::Validation(ValidationError::range(
                "dose_number",
                1,
                vaccine.total_doses,
            )));
        }

        ValidationBuilder::new("date_given", Some(self.date_given))
            .not_after(today)
            .validate()
    }
}

/// Filter pushed into vaccination queries. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub district_id: Option<Uuid>,
    pub vaccine_type_id: Option<Uuid>,
}

impl VaccinationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn with_date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn with_district(mut self, district_id: Uuid) -> Self {
        self.district_id = Some(district_id);
        self
    }

    pub fn with_vaccine_type(mut self, vaccine_type_id: Uuid) -> Self {
        self.vaccine_type_id = Some(vaccine_type_id);
        self
    }
}

/// Which referenced entities to pull alongside each vaccination row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaccinationJoin {
    pub beneficiary: bool,
    pub vaccine_type: bool,
    pub district: bool,
    pub block: bool,
}

impl VaccinationJoin {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            beneficiary: true,
            vaccine_type: true,
            district: true,
            block: true,
        }
    }
}

/// A vaccination with the joined fields that were requested.
/// Fields of entities that were not joined are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    #[serde(flatten)]
    pub vaccination: Vaccination,
    pub beneficiary_name: Option<String>,
    pub beneficiary_date_of_birth: Option<NaiveDate>,
    pub beneficiary_gender: Option<String>,
    pub vaccine_name: Option<String>,
    pub district_name: Option<String>,
    pub district_target_population: Option<i64>,
    pub block_name: Option<String>,
}

/// VaccinationRecordRow - SQLite row for the joined vaccination query
#[derive(Debug, Clone, FromRow)]
pub struct VaccinationRecordRow {
    pub id: String,
    pub beneficiary_id: String,
    pub vaccine_type_id: String,
    pub dose_number: i64,
    pub date_given: String,
    pub district_id: String,
    pub block_id: Option<String>,
    pub village: Option<String>,
    pub batch_number: Option<String>,
    pub notes: Option<String>,
    pub administered_by: String,
    pub created_at: String,
    pub beneficiary_name: Option<String>,
    pub beneficiary_date_of_birth: Option<String>,
    pub beneficiary_gender: Option<String>,
    pub vaccine_name: Option<String>,
    pub district_name: Option<String>,
    pub district_target_population: Option<i64>,
    pub block_name: Option<String>,
}

impl VaccinationRecordRow {
    pub fn into_entity(self) -> DomainResult<VaccinationRecord> {
        let vaccination = Vaccination {
            id: common::parse_uuid(&self.id, "id")?,
            beneficiary_id: common::parse_uuid(&self.beneficiary_id, "beneficiary_id")?,
            vaccine_type_id: common::parse_uuid(&self.vaccine_type_id, "vaccine_type_id")?,
            dose_number: self.dose_number,
            date_given: common::parse_date(&self.date_given, "date_given")?,
            district_id: common::parse_uuid(&self.district_id, "district_id")?,
            block_id: common::parse_optional_uuid(self.block_id.as_deref(), "block_id")?,
            village: self.village,
            batch_number: self.batch_number,
            notes: self.notes,
            administered_by: common::parse_uuid(&self.administered_by, "administered_by")?,
            created_at: common::parse_timestamp(&self.created_at, "created_at")?,
        };

        Ok(VaccinationRecord {
            vaccination,
            beneficiary_name: self.beneficiary_name,
            beneficiary_date_of_birth: common::parse_optional_date(
                self.beneficiary_date_of_birth.as_deref(),
                "beneficiary_date_of_birth",
            )?,
            beneficiary_gender: self.beneficiary_gender,
            vaccine_name: self.vaccine_name,
            district_name: self.district_name,
            district_target_population: self.district_target_population,
            block_name: self.block_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vaccine(total_doses: i64) -> VaccineType {
        VaccineType {
            id: Uuid::new_v4(),
            name: "OPV".to_string(),
            total_doses,
            description: None,
            min_age_months: None,
            max_age_months: None,
            created_at: Utc::now(),
        }
    }

    fn new_vaccination(dose_number: i64, date_given: NaiveDate) -> NewVaccination {
        NewVaccination {
            beneficiary_id: Uuid::new_v4(),
            vaccine_type_id: Uuid::new_v4(),
            dose_number,
            date_given,
            district_id: Uuid::new_v4(),
            block_id: None,
            village: None,
            batch_number: Some("B-001".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_dose_number_bounded_by_series() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(new_vaccination(3, today).validate_against(&vaccine(3), today).is_ok());
        assert!(new_vaccination(4, today).validate_against(&vaccine(3), today).is_err());
        assert!(new_vaccination(0, today).validate_against(&vaccine(3), today).is_err());
    }

    #[test]
    fn test_date_given_not_in_future() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        let result = new_vaccination(1, tomorrow).validate_against(&vaccine(1), today);
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidValue { field, .. })) if field == "date_given"
        ));
    }

    #[test]
    fn test_district_required() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut dto = new_vaccination(1, today);
        dto.district_id = Uuid::nil();
        assert!(dto.validate().is_err());
    }
}
