use crate::auth::AuthContext;
use crate::domains::beneficiary::types::{
    Beneficiary, BeneficiaryDetailsRow, BeneficiaryFilter, BeneficiaryRow, BeneficiarySearchResult,
    BeneficiarySearchRow, BeneficiaryWithDetails, NewBeneficiary, UpdateBeneficiary,
};
use crate::domains::core::repository::{FindById, HardDeletable};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use crate::validation::common;
use async_trait::async_trait;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trait defining beneficiary repository operations
#[async_trait]
pub trait BeneficiaryRepository: FindById<Beneficiary> + HardDeletable + Send + Sync {
    async fn create(
        &self,
        new_beneficiary: &NewBeneficiary,
        auth: &AuthContext,
    ) -> DomainResult<Beneficiary>;

    async fn update(&self, id: Uuid, update_data: &UpdateBeneficiary) -> DomainResult<Beneficiary>;

    /// Filtered list, newest first, with district/block names and dose counts
    async fn find_with_details(
        &self,
        filter: &BeneficiaryFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<BeneficiaryWithDetails>>;

    /// Case-insensitive name search
    async fn search_by_name(&self, term: &str, limit: u32) -> DomainResult<Vec<BeneficiarySearchResult>>;
}

/// SQLite implementation for BeneficiaryRepository
#[derive(Debug, Clone)]
pub struct SqliteBeneficiaryRepository {
    pool: SqlitePool,
}

impl SqliteBeneficiaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row_to_entity(row: BeneficiaryRow) -> DomainResult<Beneficiary> {
        row.into_entity()
            .map_err(|e| DomainError::Internal(format!("Failed to map row to entity: {}", e)))
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &BeneficiaryFilter) {
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            builder.push(" AND LOWER(b.name) LIKE ");
            builder.push_bind(format!("%{}%", search.to_lowercase()));
        }
        if let Some(district_id) = filter.district_id {
            builder.push(" AND b.district_id = ");
            builder.push_bind(district_id.to_string());
        }
        if let Some(gender) = &filter.gender {
            builder.push(" AND b.gender = ");
            builder.push_bind(gender.clone());
        }
    }
}

#[async_trait]
impl FindById<Beneficiary> for SqliteBeneficiaryRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Beneficiary> {
        let row = query_as::<_, BeneficiaryRow>("SELECT * FROM beneficiaries WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Beneficiary".to_string(), id))?;

        Self::map_row_to_entity(row)
    }
}

#[async_trait]
impl HardDeletable for SqliteBeneficiaryRepository {
    fn entity_name(&self) -> &'static str {
        "beneficiaries"
    }

    async fn hard_delete(&self, id: Uuid) -> DomainResult<()> {
        let result = query("DELETE FROM beneficiaries WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Beneficiary".to_string(), id));
        }
        Ok(())
    }
}

#[async_trait]
impl BeneficiaryRepository for SqliteBeneficiaryRepository {
    async fn create(
        &self,
        new_beneficiary: &NewBeneficiary,
        auth: &AuthContext,
    ) -> DomainResult<Beneficiary> {
        let id = Uuid::new_v4();
        let now_str = common::timestamp_now();

        query(
            r#"
            INSERT INTO beneficiaries (
                id, name, date_of_birth, gender, guardian_name, guardian_phone,
                address, village, district_id, block_id, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_beneficiary.name.trim())
        .bind(new_beneficiary.date_of_birth.format(DATE_FORMAT).to_string())
        .bind(&new_beneficiary.gender)
        .bind(&new_beneficiary.guardian_name)
        .bind(&new_beneficiary.guardian_phone)
        .bind(&new_beneficiary.address)
        .bind(&new_beneficiary.village)
        .bind(new_beneficiary.district_id.to_string())
        .bind(new_beneficiary.block_id.map(|b| b.to_string()))
        .bind(auth.user_id.to_string())
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn update(&self, id: Uuid, update_data: &UpdateBeneficiary) -> DomainResult<Beneficiary> {
        // Existence check first so an empty update still reports a missing record
        self.find_by_id(id).await?;

        if update_data.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE beneficiaries SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = &update_data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(dob) = update_data.date_of_birth {
            separated.push("date_of_birth = ");
            separated.push_bind_unseparated(dob.format(DATE_FORMAT).to_string());
        }
        if let Some(gender) = &update_data.gender {
            separated.push("gender = ");
            separated.push_bind_unseparated(gender.clone());
        }
        if let Some(guardian_name) = &update_data.guardian_name {
            separated.push("guardian_name = ");
            separated.push_bind_unseparated(guardian_name.clone());
        }
        if let Some(guardian_phone) = &update_data.guardian_phone {
            separated.push("guardian_phone = ");
            separated.push_bind_unseparated(guardian_phone.clone());
        }
        if let Some(address) = &update_data.address {
            separated.push("address = ");
            separated.push_bind_unseparated(address.clone());
        }
        if let Some(village) = &update_data.village {
            separated.push("village = ");
            separated.push_bind_unseparated(village.clone());
        }
        if let Some(district_id) = update_data.district_id {
            separated.push("district_id = ");
            separated.push_bind_unseparated(district_id.to_string());
        }
        if let Some(block_id) = update_data.block_id {
            separated.push("block_id = ");
            separated.push_bind_unseparated(block_id.to_string());
        }
        separated.push("updated_at = ");
        separated.push_bind_unseparated(common::timestamp_now());

        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_with_details(
        &self,
        filter: &BeneficiaryFilter,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<BeneficiaryWithDetails>> {
        let mut count_builder =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM beneficiaries b WHERE 1=1");
        Self::push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT b.*, d.name AS district_name, bl.name AS block_name, \
             (SELECT COUNT(*) FROM vaccinations v WHERE v.beneficiary_id = b.id) AS vaccination_count \
             FROM beneficiaries b \
             LEFT JOIN districts d ON d.id = b.district_id \
             LEFT JOIN blocks bl ON bl.id = b.block_id \
             WHERE 1=1",
        );
        Self::push_filters(&mut builder, filter);
        builder.push(" ORDER BY b.created_at DESC LIMIT ");
        builder.push_bind(params.per_page as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows = builder
            .build_query_as::<BeneficiaryDetailsRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(BeneficiaryDetailsRow::into_entity)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total as u64, params))
    }

    async fn search_by_name(&self, term: &str, limit: u32) -> DomainResult<Vec<BeneficiarySearchResult>> {
        let pattern = format!("%{}%", term.trim().to_lowercase());

        let rows = query_as::<_, BeneficiarySearchRow>(
            "SELECT b.id, b.name, b.date_of_birth, b.gender, d.name AS district_name
             FROM beneficiaries b
             LEFT JOIN districts d ON d.id = b.district_id
             WHERE LOWER(b.name) LIKE ?
             ORDER BY b.name ASC
             LIMIT ?",
        )
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter().map(BeneficiarySearchRow::into_entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Fixture};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_partial_update() {
        let fixture = Fixture::new().await;
        let repo = SqliteBeneficiaryRepository::new(fixture.pool.clone());

        let updated = repo
            .update(
                fixture.child.id,
                &UpdateBeneficiary {
                    village: Some("Lonikand".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.village.as_deref(), Some("Lonikand"));
        assert_eq!(updated.name, fixture.child.name);
        assert_eq!(updated.district_id, fixture.child.district_id);
        assert!(updated.updated_at >= fixture.child.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_beneficiary() {
        let fixture = Fixture::new().await;
        let repo = SqliteBeneficiaryRepository::new(fixture.pool.clone());
        let result = repo.update(Uuid::new_v4(), &UpdateBeneficiary::default()).await;
        assert!(matches!(result, Err(DomainError::EntityNotFound(_, _))));
    }

    #[tokio::test]
    async fn test_list_with_details_and_filters() {
        let fixture = Fixture::new().await;
        let today = test_support::fixed_today();
        let repo = SqliteBeneficiaryRepository::new(fixture.pool.clone());

        let ravi = fixture
            .register("Ravi Kale", NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(), "male", fixture.district_b.id)
            .await;
        fixture.vaccinate(fixture.bcg.id, 1, today, fixture.district_a.id).await;

        let all = repo
            .find_with_details(&BeneficiaryFilter::default(), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        // Newest registration first
        assert_eq!(all.items[0].beneficiary.id, ravi.id);
        assert_eq!(all.items[0].district_name.as_deref(), Some("District B"));
        assert_eq!(all.items[0].vaccination_count, 0);
        assert_eq!(all.items[1].vaccination_count, 1);

        let males = repo
            .find_with_details(
                &BeneficiaryFilter {
                    gender: Some("male".to_string()),
                    ..Default::default()
                },
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(males.total, 1);

        let by_name = repo
            .find_with_details(
                &BeneficiaryFilter {
                    search: Some("ASHA".to_string()),
                    district_id: Some(fixture.district_a.id),
                    gender: None,
                },
                PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_name.items.len(), 1);
        assert_eq!(by_name.items[0].beneficiary.id, fixture.child.id);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_limited() {
        let fixture = Fixture::new().await;
        let repo = SqliteBeneficiaryRepository::new(fixture.pool.clone());
        for i in 0..3 {
            fixture
                .register(&format!("Sunita {}", i), NaiveDate::from_ymd_opt(2022, 5, 1).unwrap(), "female", fixture.district_a.id)
                .await;
        }

        let found = repo.search_by_name("sUNiTa", 2).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].district_name.as_deref(), Some("District A"));
        assert!(repo.search_by_name("nobody", 20).await.unwrap().is_empty());
    }
}
