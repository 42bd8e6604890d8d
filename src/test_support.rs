//! In-memory database and seed data shared by the unit tests.

use crate::auth::{AuthContext, UserRole};
use crate::db_migration;
use crate::domains::beneficiary::{Beneficiary, BeneficiaryRepository, NewBeneficiary, SqliteBeneficiaryRepository};
use crate::domains::reference::{
    Block, District, NewBlock, NewDistrict, NewVaccineType, ReferenceDataRepository,
    SqliteReferenceDataRepository, VaccineType,
};
use crate::domains::vaccination::{NewVaccination, SqliteVaccinationRepository, Vaccination, VaccinationRepository};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

/// Fresh in-memory database with all migrations applied.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db_migration::initialize_database(&pool).await.unwrap();
    pool
}

/// 2024-06-15 10:30:00, the reference "now" for tests.
pub fn fixed_now() -> NaiveDateTime {
    fixed_today().and_hms_opt(10, 30, 0).unwrap()
}

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub fn health_worker() -> AuthContext {
    AuthContext::new(Uuid::new_v4(), UserRole::HealthWorker, "test-device".to_string())
}

pub async fn seed_district(pool: &SqlitePool, name: &str, target_population: i64) -> District {
    SqliteReferenceDataRepository::new(pool.clone())
        .create_district(&NewDistrict {
            name: name.to_string(),
            state: "Maharashtra".to_string(),
            target_population,
        })
        .await
        .unwrap()
}

pub async fn seed_block(pool: &SqlitePool, district_id: Uuid, name: &str) -> Block {
    SqliteReferenceDataRepository::new(pool.clone())
        .create_block(&NewBlock {
            name: name.to_string(),
            district_id,
            target_population: 100,
        })
        .await
        .unwrap()
}

pub async fn seed_vaccine(pool: &SqlitePool, name: &str, total_doses: i64) -> VaccineType {
    SqliteReferenceDataRepository::new(pool.clone())
        .create_vaccine_type(&NewVaccineType {
            name: name.to_string(),
            total_doses,
            description: None,
            min_age_months: None,
            max_age_months: None,
        })
        .await
        .unwrap()
}

/// Two districts, two vaccines and one registered child.
pub struct Fixture {
    pub pool: SqlitePool,
    pub auth: AuthContext,
    pub district_a: District,
    pub district_b: District,
    pub bcg: VaccineType,
    pub opv: VaccineType,
    /// Born 2023-12-01, under one year old at `fixed_now()`
    pub child: Beneficiary,
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let auth = health_worker();
        let district_a = seed_district(&pool, "District A", 1000).await;
        let district_b = seed_district(&pool, "District B", 400).await;
        let bcg = seed_vaccine(&pool, "BCG", 1).await;
        let opv = seed_vaccine(&pool, "OPV", 4).await;

        let child = SqliteBeneficiaryRepository::new(pool.clone())
            .create(
                &NewBeneficiary {
                    name: "Asha Patil".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
                    gender: "female".to_string(),
                    guardian_name: None,
                    guardian_phone: None,
                    address: None,
                    village: None,
                    district_id: district_a.id,
                    block_id: None,
                },
                &auth,
            )
            .await
            .unwrap();

        Self {
            pool,
            auth,
            district_a,
            district_b,
            bcg,
            opv,
            child,
        }
    }

    pub async fn register(&self, name: &str, date_of_birth: NaiveDate, gender: &str, district_id: Uuid) -> Beneficiary {
        SqliteBeneficiaryRepository::new(self.pool.clone())
            .create(
                &NewBeneficiary {
                    name: name.to_string(),
                    date_of_birth,
                    gender: gender.to_string(),
                    guardian_name: None,
                    guardian_phone: None,
                    address: None,
                    village: None,
                    district_id,
                    block_id: None,
                },
                &self.auth,
            )
            .await
            .unwrap()
    }

    /// Record a dose for the fixture child.
    pub async fn vaccinate(&self, vaccine_type_id: Uuid, dose_number: i64, date_given: NaiveDate, district_id: Uuid) -> Vaccination {
        self.vaccinate_beneficiary(self.child.id, vaccine_type_id, dose_number, date_given, district_id)
            .await
    }

    pub async fn vaccinate_beneficiary(
        &self,
        beneficiary_id: Uuid,
        vaccine_type_id: Uuid,
        dose_number: i64,
        date_given: NaiveDate,
        district_id: Uuid,
    ) -> Vaccination {
        SqliteVaccinationRepository::new(self.pool.clone())
            .create(
                &NewVaccination {
                    beneficiary_id,
                    vaccine_type_id,
                    dose_number,
                    date_given,
                    district_id,
                    block_id: None,
                    village: None,
                    batch_number: None,
                    notes: None,
                },
                &self.auth,
            )
            .await
            .unwrap()
    }
}
