use crate::auth::AuthContext;
use crate::domains::core::repository::{FindById, HardDeletable};
use crate::domains::vaccination::types::{
    NewVaccination, Vaccination, VaccinationJoin, VaccinationQuery, VaccinationRecord,
    VaccinationRecordRow,
};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::types::{PaginatedResult, PaginationParams};
use crate::validation::common;
use async_trait::async_trait;
use sqlx::{query, query_scalar, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Record-store contract for vaccinations: filtered, joined, ordered and paginated reads.
#[async_trait]
pub trait VaccinationRepository: FindById<Vaccination> + HardDeletable + Send + Sync {
    async fn create(
        &self,
        new_vaccination: &NewVaccination,
        auth: &AuthContext,
    ) -> DomainResult<Vaccination>;

    /// Find one vaccination with every referenced entity joined
    async fn find_record(&self, id: Uuid) -> DomainResult<VaccinationRecord>;

    /// Matching rows ordered by `date_given` desc then `created_at` desc, optionally capped
    async fn query_vaccinations(
        &self,
        filter: &VaccinationQuery,
        join: VaccinationJoin,
        limit: Option<u32>,
    ) -> DomainResult<Vec<VaccinationRecord>>;

    /// Same ordering as `query_vaccinations`, one page plus the total match count
    async fn find_by_filter(
        &self,
        filter: &VaccinationQuery,
        join: VaccinationJoin,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<VaccinationRecord>>;

    async fn count_by_beneficiary(&self, beneficiary_id: Uuid) -> DomainResult<i64>;
}

/// SQLite implementation for VaccinationRepository
#[derive(Debug, Clone)]
pub struct SqliteVaccinationRepository {
    pool: SqlitePool,
}

impl SqliteVaccinationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// SELECT list and joins. Columns of entities that are not joined come back as NULL.
    fn select_with_joins(join: VaccinationJoin) -> QueryBuilder<'static, Sqlite> {
        let mut sql = String::from(
            "SELECT v.id, v.beneficiary_id, v.vaccine_type_id, v.dose_number, v.date_given, \
             v.district_id, v.block_id, v.village, v.batch_number, v.notes, v.administered_by, \
             v.created_at, ",
        );

        sql.push_str(if join.beneficiary {
            "b.name AS beneficiary_name, b.date_of_birth AS beneficiary_date_of_birth, \
             b.gender AS beneficiary_gender, "
        } else {
            "NULL AS beneficiary_name, NULL AS beneficiary_date_of_birth, NULL AS beneficiary_gender, "
        });
        sql.push_str(if join.vaccine_type {
            "vt.name AS vaccine_name, "
        } else {
            "NULL AS vaccine_name, "
        });
        sql.push_str(if join.district {
            "d.name AS district_name, d.target_population AS district_target_population, "
        } else {
            "NULL AS district_name, NULL AS district_target_population, "
        });
        sql.push_str(if join.block {
            "bl.name AS block_name "
        } else {
            "NULL AS block_name "
        });

        sql.push_str("FROM vaccinations v ");
        if join.beneficiary {
            sql.push_str("LEFT JOIN beneficiaries b ON b.id = v.beneficiary_id ");
        }
        if join.vaccine_type {
            sql.push_str("LEFT JOIN vaccine_types vt ON vt.id = v.vaccine_type_id ");
        }
        if join.district {
            sql.push_str("LEFT JOIN districts d ON d.id = v.district_id ");
        }
        if join.block {
            sql.push_str("LEFT JOIN blocks bl ON bl.id = v.block_id ");
        }
        sql.push_str("WHERE 1=1");

        QueryBuilder::new(sql)
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &VaccinationQuery) {
        if let Some(date_from) = filter.date_from {
            builder.push(" AND v.date_given >= ");
            builder.push_bind(date_from.format(DATE_FORMAT).to_string());
        }
        if let Some(date_to) = filter.date_to {
            builder.push(" AND v.date_given <= ");
            builder.push_bind(date_to.format(DATE_FORMAT).to_string());
        }
        if let Some(district_id) = filter.district_id {
            builder.push(" AND v.district_id = ");
            builder.push_bind(district_id.to_string());
        }
        if let Some(vaccine_type_id) = filter.vaccine_type_id {
            builder.push(" AND v.vaccine_type_id = ");
            builder.push_bind(vaccine_type_id.to_string());
        }
    }

    fn push_ordering(builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" ORDER BY v.date_given DESC, v.created_at DESC");
    }

    fn map_rows(rows: Vec<VaccinationRecordRow>) -> DomainResult<Vec<VaccinationRecord>> {
        rows.into_iter()
            .map(VaccinationRecordRow::into_entity)
            .collect()
    }
}

#[async_trait]
impl FindById<Vaccination> for SqliteVaccinationRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Vaccination> {
        let mut builder = Self::select_with_joins(VaccinationJoin::none());
        builder.push(" AND v.id = ");
        builder.push_bind(id.to_string());

        let row = builder
            .build_query_as::<VaccinationRecordRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Vaccination".to_string(), id))?;

        Ok(row.into_entity()?.vaccination)
    }
}

#[async_trait]
impl HardDeletable for SqliteVaccinationRepository {
    fn entity_name(&self) -> &'static str {
        "vaccinations"
    }

    async fn hard_delete(&self, id: Uuid) -> DomainResult<()> {
        let result = query("DELETE FROM vaccinations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Vaccination".to_string(), id));
        }
        Ok(())
    }
}

#[async_trait]
impl VaccinationRepository for SqliteVaccinationRepository {
    async fn create(
        &self,
        new_vaccination: &NewVaccination,
        auth: &AuthContext,
    ) -> DomainResult<Vaccination> {
        let id = Uuid::new_v4();

        query(
            r#"
            INSERT INTO vaccinations (
                id, beneficiary_id, vaccine_type_id, dose_number, date_given,
                district_id, block_id, village, batch_number, notes,
                administered_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_vaccination.beneficiary_id.to_string())
        .bind(new_vaccination.vaccine_type_id.to_string())
        .bind(new_vaccination.dose_number)
        .bind(new_vaccination.date_given.format(DATE_FORMAT).to_string())
        .bind(new_vaccination.district_id.to_string())
        .bind(new_vaccination.block_id.map(|b| b.to_string()))
        .bind(&new_vaccination.village)
        .bind(&new_vaccination.batch_number)
        .bind(&new_vaccination.notes)
        .bind(auth.user_id.to_string())
        .bind(common::timestamp_now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        self.find_by_id(id).await
    }

    async fn find_record(&self, id: Uuid) -> DomainResult<VaccinationRecord> {
        let mut builder = Self::select_with_joins(VaccinationJoin::all());
        builder.push(" AND v.id = ");
        builder.push_bind(id.to_string());

        let row = builder
            .build_query_as::<VaccinationRecordRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| DomainError::EntityNotFound("Vaccination".to_string(), id))?;

        row.into_entity()
    }

    async fn query_vaccinations(
        &self,
        filter: &VaccinationQuery,
        join: VaccinationJoin,
        limit: Option<u32>,
    ) -> DomainResult<Vec<VaccinationRecord>> {
        let mut builder = Self::select_with_joins(join);
        Self::push_filters(&mut builder, filter);
        Self::push_ordering(&mut builder);
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let rows = builder
            .build_query_as::<VaccinationRecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Self::map_rows(rows)
    }

    async fn find_by_filter(
        &self,
        filter: &VaccinationQuery,
        join: VaccinationJoin,
        params: PaginationParams,
    ) -> DomainResult<PaginatedResult<VaccinationRecord>> {
        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM vaccinations v WHERE 1=1");
        Self::push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let mut builder = Self::select_with_joins(join);
        Self::push_filters(&mut builder, filter);
        Self::push_ordering(&mut builder);
        builder.push(" LIMIT ");
        builder.push_bind(params.per_page as i64);
        builder.push(" OFFSET ");
        builder.push_bind(params.offset() as i64);

        let rows = builder
            .build_query_as::<VaccinationRecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(PaginatedResult::new(Self::map_rows(rows)?, total as u64, params))
    }

    async fn count_by_beneficiary(&self, beneficiary_id: Uuid) -> DomainResult<i64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM vaccinations WHERE beneficiary_id = ?",
        )
        .bind(beneficiary_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(count)
    }
}
