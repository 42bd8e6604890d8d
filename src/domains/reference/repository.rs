use crate::domains::reference::types::{
    Block, BlockRow, District, DistrictRow, NewBlock, NewDistrict, NewVaccineType, VaccineType,
    VaccineTypeRow,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::validation::{common, Validate};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use uuid::Uuid;

/// Read access to the reference tables, plus seeding helpers.
#[async_trait]
pub trait ReferenceDataRepository: Send + Sync {
    /// All districts ordered by name
    async fn get_districts(&self) -> DomainResult<Vec<District>>;

    /// Blocks ordered by name, optionally restricted to one district
    async fn get_blocks(&self, district_id: Option<Uuid>) -> DomainResult<Vec<Block>>;

    /// All vaccine types ordered by name
    async fn get_vaccine_types(&self) -> DomainResult<Vec<VaccineType>>;

    async fn find_district(&self, id: Uuid) -> DomainResult<District>;

    async fn find_vaccine_type(&self, id: Uuid) -> DomainResult<VaccineType>;

    async fn create_district(&self, new_district: &NewDistrict) -> DomainResult<District>;

    async fn create_block(&self, new_block: &NewBlock) -> DomainResult<Block>;

    async fn create_vaccine_type(&self, new_vaccine: &NewVaccineType) -> DomainResult<VaccineType>;
}

/// SQLite implementation for ReferenceDataRepository
#[derive(Debug, Clone)]
pub struct SqliteReferenceDataRepository {
    pool: SqlitePool,
}

impl SqliteReferenceDataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceDataRepository for SqliteReferenceDataRepository {
    async fn get_districts(&self) -> DomainResult<Vec<District>> {
        let rows = query_as::<_, DistrictRow>(
            "SELECT id, name, state, target_population, created_at FROM districts ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter().map(DistrictRow::into_entity).collect()
    }

    async fn get_blocks(&self, district_id: Option<Uuid>) -> DomainResult<Vec<Block>> {
        let rows = match district_id {
            Some(district_id) => {
                query_as::<_, BlockRow>(
                    "SELECT id, name, district_id, target_population, created_at
                     FROM blocks WHERE district_id = ? ORDER BY name ASC",
                )
                .bind(district_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                query_as::<_, BlockRow>(
                    "SELECT id, name, district_id, target_population, created_at
                     FROM blocks ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(DbError::from)?;

        rows.into_iter().map(BlockRow::into_entity).collect()
    }

    async fn get_vaccine_types(&self) -> DomainResult<Vec<VaccineType>> {
        let rows = query_as::<_, VaccineTypeRow>(
            "SELECT id, name, total_doses, description, min_age_months, max_age_months, created_at
             FROM vaccine_types ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter().map(VaccineTypeRow::into_entity).collect()
    }

    async fn find_district(&self, id: Uuid) -> DomainResult<District> {
        let row = query_as::<_, DistrictRow>(
            "SELECT id, name, state, target_population, created_at FROM districts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("District".to_string(), id))?;

        row.into_entity()
    }

    async fn find_vaccine_type(&self, id: Uuid) -> DomainResult<VaccineType> {
        let row = query_as::<_, VaccineTypeRow>(
            "SELECT id, name, total_doses, description, min_age_months, max_age_months, created_at
             FROM vaccine_types WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("VaccineType".to_string(), id))?;

        row.into_entity()
    }

    async fn create_district(&self, new_district: &NewDistrict) -> DomainResult<District> {
        new_district.validate()?;

        let id = Uuid::new_v4();
        query(
            "INSERT INTO districts (id, name, state, target_population, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(new_district.name.trim())
        .bind(&new_district.state)
        .bind(new_district.target_population)
        .bind(common::timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_district(id).await
    }

    async fn create_block(&self, new_block: &NewBlock) -> DomainResult<Block> {
        new_block.validate()?;

        let id = Uuid::new_v4();
        query(
            "INSERT INTO blocks (id, name, district_id, target_population, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(new_block.name.trim())
        .bind(new_block.district_id.to_string())
        .bind(new_block.target_population)
        .bind(common::timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = query_as::<_, BlockRow>(
            "SELECT id, name, district_id, target_population, created_at FROM blocks WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.into_entity()
    }

    async fn create_vaccine_type(&self, new_vaccine: &NewVaccineType) -> DomainResult<VaccineType> {
        new_vaccine.validate()?;

        let id = Uuid::new_v4();
        query(
            "INSERT INTO vaccine_types (
                id, name, total_doses, description, min_age_months, max_age_months, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(new_vaccine.name.trim())
        .bind(new_vaccine.total_doses)
        .bind(&new_vaccine.description)
        .bind(new_vaccine.min_age_months)
        .bind(new_vaccine.max_age_months)
        .bind(common::timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_vaccine_type(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_reference_lists_are_ordered_by_name() {
        let pool = test_support::test_pool().await;
        let repo = SqliteReferenceDataRepository::new(pool.clone());

        let pune = test_support::seed_district(&pool, "Pune", 1000).await;
        let akola = test_support::seed_district(&pool, "Akola", 500).await;
        test_support::seed_block(&pool, pune.id, "Shirur").await;
        test_support::seed_block(&pool, pune.id, "Baramati").await;
        test_support::seed_block(&pool, akola.id, "Telhara").await;
        test_support::seed_vaccine(&pool, "OPV", 3).await;
        test_support::seed_vaccine(&pool, "BCG", 1).await;

        let names: Vec<String> = repo.get_districts().await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Akola", "Pune"]);

        let blocks: Vec<String> = repo.get_blocks(Some(pune.id)).await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(blocks, vec!["Baramati", "Shirur"]);
        assert_eq!(repo.get_blocks(None).await.unwrap().len(), 3);

        let vaccines: Vec<String> = repo.get_vaccine_types().await.unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(vaccines, vec!["BCG", "OPV"]);
    }

    #[tokio::test]
    async fn test_find_missing_vaccine_type() {
        let pool = test_support::test_pool().await;
        let repo = SqliteReferenceDataRepository::new(pool);
        let missing = Uuid::new_v4();
        assert!(matches!(
            repo.find_vaccine_type(missing).await,
            Err(DomainError::EntityNotFound(_, id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_block_requires_existing_district() {
        let pool = test_support::test_pool().await;
        let repo = SqliteReferenceDataRepository::new(pool);
        let result = repo
            .create_block(&NewBlock {
                name: "Orphan".to_string(),
                district_id: Uuid::new_v4(),
                target_population: 0,
            })
            .await;
        assert!(matches!(result, Err(DomainError::Database(_))));
    }
}
