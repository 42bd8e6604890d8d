use crate::domains::dashboard::aggregation;
use crate::domains::reference::ReferenceDataRepository;
use crate::domains::report::types::{Report, ReportFilters, ReportKind};
use crate::domains::vaccination::{VaccinationJoin, VaccinationRepository};
use crate::errors::{DomainError, ServiceResult, ValidationError};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Build the rows of one report kind for `filters`.
    async fn generate(&self, kind: ReportKind, filters: &ReportFilters) -> ServiceResult<Report>;
}

#[derive(Clone)]
pub struct ReportServiceImpl {
    vaccination_repo: Arc<dyn VaccinationRepository>,
    reference_repo: Arc<dyn ReferenceDataRepository>,
}

impl ReportServiceImpl {
    pub fn new(
        vaccination_repo: Arc<dyn VaccinationRepository>,
        reference_repo: Arc<dyn ReferenceDataRepository>,
    ) -> Self {
        Self {
            vaccination_repo,
            reference_repo,
        }
    }
}

#[async_trait]
impl ReportService for ReportServiceImpl {
    async fn generate(&self, kind: ReportKind, filters: &ReportFilters) -> ServiceResult<Report> {
        // 1. A selected district must exist; coverage lists it even with no doses
        let districts = match filters.district_id {
            Some(id) => {
                let district = self.reference_repo.find_district(id).await.map_err(|e| match e {
                    DomainError::EntityNotFound(_, _) => DomainError::Validation(
                        ValidationError::invalid_value("district_id", "district does not exist"),
                    ),
                    other => other,
                })?;
                vec![district]
            }
            None if kind == ReportKind::Coverage => self.reference_repo.get_districts().await?,
            None => Vec::new(),
        };

        // 2. Fetch matching rows with the joins the report needs
        let join = match kind {
            ReportKind::Summary => VaccinationJoin {
                vaccine_type: true,
                ..VaccinationJoin::none()
            },
            ReportKind::Coverage => VaccinationJoin::none(),
            ReportKind::Monthly => VaccinationJoin {
                beneficiary: true,
                ..VaccinationJoin::none()
            },
        };
        let records = self
            .vaccination_repo
            .query_vaccinations(&filters.to_query(), join, None)
            .await?;

        log::info!(
            "Generating {} report over {} vaccinations",
            kind.as_str(),
            records.len()
        );

        // 3. Aggregate
        let report = match kind {
            ReportKind::Summary => Report::Summary(aggregation::vaccine_dose_summary(&records)),
            ReportKind::Coverage => Report::Coverage(aggregation::district_coverage(&records, &districts)),
            ReportKind::Monthly => Report::Monthly(aggregation::monthly_activity(&records)),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::reference::SqliteReferenceDataRepository;
    use crate::domains::report::writer::to_csv_string;
    use crate::domains::vaccination::SqliteVaccinationRepository;
    use crate::errors::ServiceError;
    use crate::test_support::{self, Fixture};
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    fn service(fixture: &Fixture) -> ReportServiceImpl {
        ReportServiceImpl::new(
            Arc::new(SqliteVaccinationRepository::new(fixture.pool.clone())),
            Arc::new(SqliteReferenceDataRepository::new(fixture.pool.clone())),
        )
    }

    async fn seed(fixture: &Fixture) {
        let today = test_support::fixed_today();
        fixture.vaccinate(fixture.bcg.id, 1, today, fixture.district_a.id).await;
        fixture.vaccinate(fixture.opv.id, 2, today - Duration::days(3), fixture.district_a.id).await;
        fixture.vaccinate(fixture.bcg.id, 1, today - Duration::days(10), fixture.district_b.id).await;

        let boy = fixture
            .register("Kiran Jadhav", NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(), "male", fixture.district_b.id)
            .await;
        fixture
            .vaccinate_beneficiary(
                boy.id,
                fixture.opv.id,
                1,
                NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
                fixture.district_b.id,
            )
            .await;
    }

    #[tokio::test]
    async fn test_summary_report() {
        let fixture = Fixture::new().await;
        seed(&fixture).await;

        let report = service(&fixture)
            .generate(ReportKind::Summary, &ReportFilters::default())
            .await
            .unwrap();
        let Report::Summary(rows) = report else {
            panic!("expected a summary report");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vaccine_name, "BCG");
        assert_eq!((rows[0].total_doses, rows[0].dose_1), (2, 2));
        assert_eq!(rows[1].vaccine_name, "OPV");
        assert_eq!((rows[1].total_doses, rows[1].dose_1, rows[1].dose_2), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_coverage_report_lists_all_districts() {
        let fixture = Fixture::new().await;
        seed(&fixture).await;
        test_support::seed_district(&fixture.pool, "District C", 0).await;

        let report = service(&fixture)
            .generate(ReportKind::Coverage, &ReportFilters::default())
            .await
            .unwrap();
        let Report::Coverage(rows) = report.clone() else {
            panic!("expected a coverage report");
        };
        let names: Vec<&str> = rows.iter().map(|r| r.district_name.as_str()).collect();
        assert_eq!(names, vec!["District A", "District B", "District C"]);
        assert_eq!(rows[0].total_vaccinations, 2);
        assert_eq!(rows[0].unique_beneficiaries, 1);
        assert_eq!(rows[0].coverage_percentage, 0.2);
        assert_eq!(rows[1].unique_beneficiaries, 2);
        assert_eq!(rows[1].coverage_percentage, 0.5);
        assert_eq!(rows[2].coverage_percentage, 0.0);

        let csv = to_csv_string(&report.to_table()).unwrap();
        assert!(csv.contains(r#""District B","400","2","2","0.50%""#));
    }

    #[tokio::test]
    async fn test_coverage_report_for_selected_district() {
        let fixture = Fixture::new().await;
        seed(&fixture).await;
        let filters = ReportFilters {
            district_id: Some(fixture.district_a.id),
            ..Default::default()
        };

        let report = service(&fixture).generate(ReportKind::Coverage, &filters).await.unwrap();
        let Report::Coverage(rows) = report else {
            panic!("expected a coverage report");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].district_name, "District A");
    }

    #[tokio::test]
    async fn test_monthly_report_counts_distinct_beneficiaries() {
        let fixture = Fixture::new().await;
        seed(&fixture).await;

        let report = service(&fixture)
            .generate(ReportKind::Monthly, &ReportFilters::default())
            .await
            .unwrap();
        let table = report.to_table();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["May 2024", "1", "1", "1", "0"]);
        assert_eq!(table.rows[1], vec!["June 2024", "3", "1", "0", "1"]);
    }

    #[tokio::test]
    async fn test_date_filters_apply() {
        let fixture = Fixture::new().await;
        seed(&fixture).await;
        let filters = ReportFilters::parse(Some("2024-06-10"), Some("2024-06-15"), None).unwrap();

        let report = service(&fixture).generate(ReportKind::Summary, &filters).await.unwrap();
        let Report::Summary(rows) = report else {
            panic!("expected a summary report");
        };
        let totals: Vec<(String, i64)> = rows.into_iter().map(|r| (r.vaccine_name, r.total_doses)).collect();
        assert_eq!(totals, vec![("BCG".to_string(), 1), ("OPV".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_unknown_district_is_rejected() {
        let fixture = Fixture::new().await;
        let filters = ReportFilters {
            district_id: Some(Uuid::new_v4()),
            ..Default::default()
        };

        let err = service(&fixture).generate(ReportKind::Summary, &filters).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }
}
