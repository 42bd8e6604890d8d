use crate::errors::{DomainResult, ValidationError, DomainError};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// District master data. `target_population` is the coverage denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub target_population: i64,
    pub created_at: DateTime<Utc>,
}

/// Block master data, always inside a parent district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: Uuid,
    pub name: String,
    pub district_id: Uuid,
    pub target_population: i64,
    pub created_at: DateTime<Utc>,
}

/// A vaccine and the number of doses in its series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineType {
    pub id: Uuid,
    pub name: String,
    pub total_doses: i64,
    pub description: Option<String>,
    pub min_age_months: Option<i64>,
    pub max_age_months: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDistrict {
    pub name: String,
    pub state: String,
    pub target_population: i64,
}

impl Validate for NewDistrict {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .not_blank()
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("target_population", Some(self.target_population))
            .range(0, i64::MAX)
            .validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlock {
    pub name: String,
    pub district_id: Uuid,
    pub target_population: i64,
}

impl Validate for NewBlock {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .not_blank()
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("district_id", Some(self.district_id))
            .not_nil()
            .validate()?;
        ValidationBuilder::new("target_population", Some(self.target_population))
            .range(0, i64::MAX)
            .validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVaccineType {
    pub name: String,
    pub total_doses: i64,
    pub description: Option<String>,
    pub min_age_months: Option<i64>,
    pub max_age_months: Option<i64>,
}

impl Validate for NewVaccineType {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("name", Some(self.name.clone()))
            .not_blank()
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("total_doses", Some(self.total_doses))
            .range(1, 10)
            .validate()?;
        if let (Some(min), Some(max)) = (self.min_age_months, self.max_age_months) {
            if min > max {
                return Err(DomainError::Validation(ValidationError::range(
                    "min_age_months",
                    0,
                    max,
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DistrictRow {
    pub id: String,
    pub name: String,
    pub state: String,
    pub target_population: i64,
    pub created_at: String,
}

impl DistrictRow {
    pub fn into_entity(self) -> DomainResult<District> {
        Ok(District {
            id: common::parse_uuid(&self.id, "id")?,
            name: self.name,
            state: self.state,
            target_population: self.target_population,
            created_at: common::parse_timestamp(&self.created_at, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BlockRow {
    pub id: String,
    pub name: String,
    pub district_id: String,
    pub target_population: i64,
    pub created_at: String,
}

impl BlockRow {
    pub fn into_entity(self) -> DomainResult<Block> {
        Ok(Block {
            id: common::parse_uuid(&self.id, "id")?,
            name: self.name,
            district_id: common::parse_uuid(&self.district_id, "district_id")?,
            target_population: self.target_population,
            created_at: common::parse_timestamp(&self.created_at, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VaccineTypeRow {
    pub id: String,
    pub name: String,
    pub total_doses: i64,
    pub description: Option<String>,
    pub min_age_months: Option<i64>,
    pub max_age_months: Option<i64>,
    pub created_at: String,
}

impl VaccineTypeRow {
    pub fn into_entity(self) -> DomainResult<VaccineType> {
        Ok(VaccineType {
            id: common::parse_uuid(&self.id, "id")?,
            name: self.name,
            total_doses: self.total_doses,
            description: self.description,
            min_age_months: self.min_age_months,
            max_age_months: self.max_age_months,
            created_at: common::parse_timestamp(&self.created_at, "created_at")?,
        })
    }
}
