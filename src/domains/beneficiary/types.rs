use crate::errors::DomainResult;
use crate::validation::{common, NestedValidator, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A person (usually a child) whose doses are tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub village: Option<String>,
    pub district_id: Uuid,
    pub block_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NewBeneficiary DTO - the intake form payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBeneficiary {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub village: Option<String>,
    pub district_id: Uuid,
    pub block_id: Option<Uuid>,
}

impl Validate for NewBeneficiary {
    fn validate(&self) -> DomainResult<()> {
        let mut validator = NestedValidator::new();

        validator.check(
            ValidationBuilder::new("name", Some(self.name.clone()))
                .required()
                .not_blank()
                .max_length(100)
                .validate(),
        );
        validator.check(common::validate_gender(&self.gender));
        validator.check(
            ValidationBuilder::new("district_id", Some(self.district_id))
                .not_nil()
                .validate(),
        );
        if let Some(phone) = &self.guardian_phone {
            validator.check(
                ValidationBuilder::new("guardian_phone", Some(phone.clone()))
                    .phone()
                    .validate(),
            );
        }
        if let Some(guardian) = &self.guardian_name {
            validator.check(
                ValidationBuilder::new("guardian_name", Some(guardian.clone()))
                    .max_length(100)
                    .validate(),
            );
        }

        validator.validate()
    }
}

impl NewBeneficiary {
    /// Full intake validation; a date of birth after `today` is rejected.
    pub fn validate_for(&self, today: NaiveDate) -> DomainResult<()> {
        self.validate()?;
        ValidationBuilder::new("date_of_birth", Some(self.date_of_birth))
            .not_after(today)
            .validate()
    }
}

/// UpdateBeneficiary DTO - only provided fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBeneficiary {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub village: Option<String>,
    pub district_id: Option<Uuid>,
    pub block_id: Option<Uuid>,
}

impl UpdateBeneficiary {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && self.guardian_name.is_none()
            && self.guardian_phone.is_none()
            && self.address.is_none()
            && self.village.is_none()
            && self.district_id.is_none()
            && self.block_id.is_none()
    }

    pub fn validate_for(&self, today: NaiveDate) -> DomainResult<()> {
        if let Some(name) = &self.name {
            ValidationBuilder::new("name", Some(name.clone()))
                .not_blank()
                .max_length(100)
                .validate()?;
        }
        if let Some(dob) = self.date_of_birth {
            ValidationBuilder::new("date_of_birth", Some(dob))
                .not_after(today)
                .validate()?;
        }
        if let Some(gender) = &self.gender {
            common::validate_gender(gender)?;
        }
        if let Some(phone) = &self.guardian_phone {
            ValidationBuilder::new("guardian_phone", Some(phone.clone()))
                .phone()
                .validate()?;
        }
        if let Some(district_id) = self.district_id {
            ValidationBuilder::new("district_id", Some(district_id))
                .not_nil()
                .validate()?;
        }
        Ok(())
    }
}

/// Filter for the beneficiary list screen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub district_id: Option<Uuid>,
    pub gender: Option<String>,
}

impl Validate for BeneficiaryFilter {
    fn validate(&self) -> DomainResult<()> {
        if let Some(gender) = &self.gender {
            common::validate_gender(gender)?;
        }
        Ok(())
    }
}

/// Beneficiary with display names and dose count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryWithDetails {
    #[serde(flatten)]
    pub beneficiary: Beneficiary,
    pub district_name: Option<String>,
    pub block_name: Option<String>,
    pub vaccination_count: i64,
}

/// Lightweight result for the vaccination form's beneficiary picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiarySearchResult {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub district_name: Option<String>,
}

/// BeneficiaryRow - SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct BeneficiaryRow {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub address: Option<String>,
    pub village: Option<String>,
    pub district_id: String,
    pub block_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BeneficiaryRow {
    pub fn into_entity(self) -> DomainResult<Beneficiary> {
        Ok(Beneficiary {
            id: common::parse_uuid(&self.id, "id")?,
            name: self.name,
            date_of_birth: common::parse_date(&self.date_of_birth, "date_of_birth")?,
            gender: self.gender,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
            address: self.address,
            village: self.village,
            district_id: common::parse_uuid(&self.district_id, "district_id")?,
            block_id: common::parse_optional_uuid(self.block_id.as_deref(), "block_id")?,
            created_by: common::parse_optional_uuid(self.created_by.as_deref(), "created_by")?,
            created_at: common::parse_timestamp(&self.created_at, "created_at")?,
            updated_at: common::parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}

/// Row for the list query: beneficiary columns plus joined names and count
#[derive(Debug, Clone, FromRow)]
pub struct BeneficiaryDetailsRow {
    #[sqlx(flatten)]
    pub beneficiary: BeneficiaryRow,
    pub district_name: Option<String>,
    pub block_name: Option<String>,
    pub vaccination_count: i64,
}

impl BeneficiaryDetailsRow {
    pub fn into_entity(self) -> DomainResult<BeneficiaryWithDetails> {
        Ok(BeneficiaryWithDetails {
            beneficiary: self.beneficiary.into_entity()?,
            district_name: self.district_name,
            block_name: self.block_name,
            vaccination_count: self.vaccination_count,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BeneficiarySearchRow {
    pub id: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub district_name: Option<String>,
}

impl BeneficiarySearchRow {
    pub fn into_entity(self) -> DomainResult<BeneficiarySearchResult> {
        Ok(BeneficiarySearchResult {
            id: common::parse_uuid(&self.id, "id")?,
            name: self.name,
            date_of_birth: common::parse_date(&self.date_of_birth, "date_of_birth")?,
            gender: self.gender,
            district_name: self.district_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DomainError, ValidationError};

    fn intake() -> NewBeneficiary {
        NewBeneficiary {
            name: "Asha Patil".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            gender: "female".to_string(),
            guardian_name: Some("Meena Patil".to_string()),
            guardian_phone: Some("9876543210".to_string()),
            address: None,
            village: Some("Wagholi".to_string()),
            district_id: Uuid::new_v4(),
            block_id: None,
        }
    }

    #[test]
    fn test_valid_intake() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(intake().validate_for(today).is_ok());
    }

    #[test]
    fn test_missing_district_is_rejected() {
        let mut dto = intake();
        dto.district_id = Uuid::nil();
        match dto.validate() {
            Err(DomainError::Validation(ValidationError::Required { field })) => assert_eq!(field, "district_id"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_future_birth_date_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut dto = intake();
        dto.date_of_birth = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert!(dto.validate_for(today).is_err());
    }

    #[test]
    fn test_bad_phone_and_gender() {
        let mut dto = intake();
        dto.guardian_phone = Some("12-34".to_string());
        assert!(dto.validate().is_err());

        let mut dto = intake();
        dto.gender = "unknown".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_only_checks_provided_fields() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let update = UpdateBeneficiary {
            village: Some("Lonikand".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert!(update.validate_for(today).is_ok());

        let update = UpdateBeneficiary {
            gender: Some("x".to_string()),
            ..Default::default()
        };
        assert!(update.validate_for(today).is_err());
        assert!(UpdateBeneficiary::default().is_empty());
    }
}
