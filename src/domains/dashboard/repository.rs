use crate::domains::dashboard::aggregation::{
    age_groups_from_counts, district_stat, sort_district_stats, sort_vaccine_stats,
    trend_window_start, zero_filled_trend, DAYS_PER_YEAR,
};
use crate::domains::dashboard::filter::{MONTH_DAYS, WEEK_DAYS};
use crate::domains::dashboard::types::{
    AgeGroup, AgeGroupStat, DashboardSummary, DistrictStat, TrendPoint, VaccineTypeStat,
};
use crate::errors::{DbError, DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::{query_as, FromRow, SqlitePool};
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Precomputed, unfiltered aggregates. Each call returns the same shape as
/// the in-process computation over the whole data set.
#[async_trait]
pub trait AggregateViewRepository: Send + Sync {
    async fn dashboard_summary(&self, today: NaiveDate) -> DomainResult<DashboardSummary>;

    async fn daily_trend(&self, days: u32, today: NaiveDate) -> DomainResult<Vec<TrendPoint>>;

    async fn vaccine_type_stats(&self, today: NaiveDate) -> DomainResult<Vec<VaccineTypeStat>>;

    async fn district_stats(&self) -> DomainResult<Vec<DistrictStat>>;

    async fn age_group_stats(&self, now: NaiveDateTime) -> DomainResult<Vec<AgeGroupStat>>;
}

/// SQLite aggregate queries standing in for materialized views.
#[derive(Debug, Clone)]
pub struct SqliteAggregateViewRepository {
    pool: SqlitePool,
}

impl SqliteAggregateViewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    total_vaccinations: i64,
    today_count: i64,
    week_count: i64,
    month_count: i64,
    total_beneficiaries: i64,
    total_districts: i64,
}

#[derive(Debug, FromRow)]
struct DailyCountRow {
    date_given: String,
    count: i64,
}

#[derive(Debug, FromRow)]
struct VaccineTypeStatRow {
    vaccine_name: String,
    total_count: i64,
    week_count: i64,
    today_count: i64,
}

#[derive(Debug, FromRow)]
struct DistrictStatRow {
    district_name: String,
    target_population: i64,
    total_vaccinations: i64,
}

#[derive(Debug, FromRow)]
struct AgeGroupRow {
    age_group: String,
    count: i64,
}

#[async_trait]
impl AggregateViewRepository for SqliteAggregateViewRepository {
    async fn dashboard_summary(&self, today: NaiveDate) -> DomainResult<DashboardSummary> {
        let row = query_as::<_, SummaryRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM vaccinations) AS total_vaccinations,
                (SELECT COUNT(*) FROM vaccinations WHERE date_given = ?1) AS today_count,
                (SELECT COUNT(*) FROM vaccinations WHERE date_given >= ?2) AS week_count,
                (SELECT COUNT(*) FROM vaccinations WHERE date_given >= ?3) AS month_count,
                (SELECT COUNT(*) FROM beneficiaries) AS total_beneficiaries,
                (SELECT COUNT(*) FROM districts) AS total_districts
            "#,
        )
        .bind(today.format(DATE_FORMAT).to_string())
        .bind((today - Duration::days(WEEK_DAYS)).format(DATE_FORMAT).to_string())
        .bind((today - Duration::days(MONTH_DAYS)).format(DATE_FORMAT).to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(DashboardSummary {
            total_vaccinations: row.total_vaccinations,
            today_count: row.today_count,
            week_count: row.week_count,
            month_count: row.month_count,
            total_beneficiaries: row.total_beneficiaries,
            total_districts: row.total_districts,
        })
    }

    async fn daily_trend(&self, days: u32, today: NaiveDate) -> DomainResult<Vec<TrendPoint>> {
        let start = trend_window_start(days, today);

        let rows = query_as::<_, DailyCountRow>(
            "SELECT date_given, COUNT(*) AS count
             FROM vaccinations
             WHERE date_given >= ? AND date_given <= ?
             GROUP BY date_given",
        )
        .bind(start.format(DATE_FORMAT).to_string())
        .bind(today.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let counts = rows
            .into_iter()
            .map(|row| {
                NaiveDate::parse_from_str(&row.date_given, DATE_FORMAT)
                    .map(|date| (date, row.count))
                    .map_err(|_| DomainError::Internal(format!("Stored date is malformed: {}", row.date_given)))
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(zero_filled_trend(counts, days, today))
    }

    async fn vaccine_type_stats(&self, today: NaiveDate) -> DomainResult<Vec<VaccineTypeStat>> {
        let rows = query_as::<_, VaccineTypeStatRow>(
            r#"
            SELECT
                vt.name AS vaccine_name,
                COUNT(*) AS total_count,
                SUM(CASE WHEN v.date_given >= ?2 THEN 1 ELSE 0 END) AS week_count,
                SUM(CASE WHEN v.date_given = ?1 THEN 1 ELSE 0 END) AS today_count
            FROM vaccinations v
            JOIN vaccine_types vt ON vt.id = v.vaccine_type_id
            GROUP BY vt.name
            "#,
        )
        .bind(today.format(DATE_FORMAT).to_string())
        .bind((today - Duration::days(WEEK_DAYS)).format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut stats: Vec<VaccineTypeStat> = rows
            .into_iter()
            .map(|row| VaccineTypeStat {
                vaccine_name: row.vaccine_name,
                total_count: row.total_count,
                week_count: row.week_count,
                today_count: row.today_count,
            })
            .collect();
        sort_vaccine_stats(&mut stats);
        Ok(stats)
    }

    async fn district_stats(&self) -> DomainResult<Vec<DistrictStat>> {
        let rows = query_as::<_, DistrictStatRow>(
            "SELECT d.name AS district_name,
                    MAX(d.target_population) AS target_population,
                    COUNT(*) AS total_vaccinations
             FROM vaccinations v
             JOIN districts d ON d.id = v.district_id
             GROUP BY d.name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut stats: Vec<DistrictStat> = rows
            .into_iter()
            .map(|row| district_stat(row.district_name, row.target_population, row.total_vaccinations))
            .collect();
        sort_district_stats(&mut stats);
        Ok(stats)
    }

    async fn age_group_stats(&self, now: NaiveDateTime) -> DomainResult<Vec<AgeGroupStat>> {
        let rows = query_as::<_, AgeGroupRow>(
            r#"
            SELECT
                CASE
                    WHEN age_days < ?2 THEN '0-1 years'
                    WHEN age_days < ?3 THEN '1-2 years'
                    WHEN age_days < ?4 THEN '2-5 years'
                    ELSE '5+ years'
                END AS age_group,
                COUNT(*) AS count
            FROM (
                SELECT julianday(?1) - julianday(b.date_of_birth) AS age_days
                FROM vaccinations v
                JOIN beneficiaries b ON b.id = v.beneficiary_id
            )
            GROUP BY age_group
            "#,
        )
        .bind(now.format(DATETIME_FORMAT).to_string())
        .bind(DAYS_PER_YEAR)
        .bind(2.0 * DAYS_PER_YEAR)
        .bind(5.0 * DAYS_PER_YEAR)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let mut counts: HashMap<AgeGroup, i64> = HashMap::new();
        for row in rows {
            match AgeGroup::from_label(&row.age_group) {
                Some(group) => {
                    counts.insert(group, row.count);
                }
                None => log::warn!("Unexpected age group label from store: {}", row.age_group),
            }
        }
        Ok(age_groups_from_counts(&counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Fixture};

    #[tokio::test]
    async fn test_views_on_empty_store() {
        let pool = test_support::test_pool().await;
        let views = SqliteAggregateViewRepository::new(pool);
        let today = test_support::fixed_today();

        let summary = views.dashboard_summary(today).await.unwrap();
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(views.daily_trend(7, today).await.unwrap().len(), 7);
        assert!(views.vaccine_type_stats(today).await.unwrap().is_empty());
        assert!(views.district_stats().await.unwrap().is_empty());

        let ages = views.age_group_stats(test_support::fixed_now()).await.unwrap();
        assert_eq!(ages.len(), 4);
        assert!(ages.iter().all(|a| a.count == 0));
    }

    #[tokio::test]
    async fn test_summary_counts_reference_tables() {
        let fixture = Fixture::new().await;
        let views = SqliteAggregateViewRepository::new(fixture.pool.clone());
        let today = test_support::fixed_today();
        fixture.vaccinate(fixture.bcg.id, 1, today, fixture.district_a.id).await;

        let summary = views.dashboard_summary(today).await.unwrap();
        assert_eq!(summary.total_vaccinations, 1);
        assert_eq!(summary.today_count, 1);
        assert_eq!(summary.total_beneficiaries, 1);
        assert_eq!(summary.total_districts, 2);
    }
}
