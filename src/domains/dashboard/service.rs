use crate::domains::dashboard::aggregation;
use crate::domains::dashboard::repository::AggregateViewRepository;
use crate::domains::dashboard::sequencer::RequestSequencer;
use crate::domains::dashboard::types::{
    AgeGroupStat, CanonicalFilter, DashboardSnapshot, DashboardSummary, DistrictStat,
    RecentVaccination, Section, TrendPoint, VaccineTypeStat,
};
use crate::domains::vaccination::{VaccinationJoin, VaccinationRepository};
use crate::errors::{DomainError, DomainResult, ValidationError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

pub const DEFAULT_RECENT_LIMIT: u32 = 10;
/// Longest trend window, in days
pub const MAX_TREND_DAYS: u32 = 366;

/// Dashboard metrics for a canonical filter.
///
/// Each metric has a precomputed path, used when the filter narrows nothing,
/// and an in-process path over the matching rows. `try_*` methods report
/// store failures; the plain methods log them and return `None` or an empty
/// list, so a failed fetch looks like "no data" to the caller.
///
/// `now` is the caller's local wall-clock time; `now.date()` is "today".
#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn try_get_dashboard_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<DashboardSummary>;

    async fn try_get_vaccination_trend(
        &self,
        filter: &CanonicalFilter,
        days: u32,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<TrendPoint>>;

    async fn try_get_vaccine_type_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<VaccineTypeStat>>;

    async fn try_get_district_stats(&self, filter: &CanonicalFilter) -> DomainResult<Vec<DistrictStat>>;

    async fn try_get_age_group_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<AgeGroupStat>>;

    async fn try_get_recent_vaccinations(
        &self,
        filter: &CanonicalFilter,
        limit: u32,
    ) -> DomainResult<Vec<RecentVaccination>>;

    async fn get_dashboard_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> Option<DashboardSummary> {
        match self.try_get_dashboard_stats(filter, now).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::error!("Error fetching dashboard stats: {}", e);
                None
            }
        }
    }

    async fn get_vaccination_trend(
        &self,
        filter: &CanonicalFilter,
        days: u32,
        now: NaiveDateTime,
    ) -> Vec<TrendPoint> {
        self.try_get_vaccination_trend(filter, days, now)
            .await
            .unwrap_or_else(|e| {
                log::error!("Error fetching vaccination trend: {}", e);
                Vec::new()
            })
    }

    async fn get_vaccine_type_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> Vec<VaccineTypeStat> {
        self.try_get_vaccine_type_stats(filter, now)
            .await
            .unwrap_or_else(|e| {
                log::error!("Error fetching vaccine type stats: {}", e);
                Vec::new()
            })
    }

    async fn get_district_stats(&self, filter: &CanonicalFilter) -> Vec<DistrictStat> {
        self.try_get_district_stats(filter).await.unwrap_or_else(|e| {
            log::error!("Error fetching district stats: {}", e);
            Vec::new()
        })
    }

    async fn get_age_group_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> Vec<AgeGroupStat> {
        self.try_get_age_group_stats(filter, now)
            .await
            .unwrap_or_else(|e| {
                log::error!("Error fetching age group stats: {}", e);
                Vec::new()
            })
    }

    async fn get_recent_vaccinations(
        &self,
        filter: &CanonicalFilter,
        limit: u32,
    ) -> Vec<RecentVaccination> {
        self.try_get_recent_vaccinations(filter, limit)
            .await
            .unwrap_or_else(|e| {
                log::error!("Error fetching recent vaccinations: {}", e);
                Vec::new()
            })
    }

    /// All sections at once, fetched concurrently, each with its own failure flag.
    async fn load_dashboard(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
        trend_days: u32,
        recent_limit: u32,
    ) -> DashboardSnapshot {
        let (summary, trend, vaccine_types, districts, age_groups, recent) = futures::join!(
            self.try_get_dashboard_stats(filter, now),
            self.try_get_vaccination_trend(filter, trend_days, now),
            self.try_get_vaccine_type_stats(filter, now),
            self.try_get_district_stats(filter),
            self.try_get_age_group_stats(filter, now),
            self.try_get_recent_vaccinations(filter, recent_limit),
        );

        DashboardSnapshot {
            filter: *filter,
            summary: Section::from_result("summary", summary.map(Some)),
            trend: Section::from_result("trend", trend),
            vaccine_types: Section::from_result("vaccine_types", vaccine_types),
            districts: Section::from_result("districts", districts),
            age_groups: Section::from_result("age_groups", age_groups),
            recent: Section::from_result("recent", recent),
        }
    }

    /// `load_dashboard` under `sequencer`; `None` when a newer load started meanwhile.
    async fn load_latest(
        &self,
        sequencer: &RequestSequencer,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
        trend_days: u32,
        recent_limit: u32,
    ) -> Option<DashboardSnapshot> {
        sequencer
            .run_latest(self.load_dashboard(filter, now, trend_days, recent_limit))
            .await
    }
}

/// Implementation of the dashboard service
#[derive(Clone)]
pub struct DashboardServiceImpl {
    vaccination_repo: Arc<dyn VaccinationRepository>,
    views: Arc<dyn AggregateViewRepository>,
}

impl DashboardServiceImpl {
    pub fn new(
        vaccination_repo: Arc<dyn VaccinationRepository>,
        views: Arc<dyn AggregateViewRepository>,
    ) -> Self {
        Self {
            vaccination_repo,
            views,
        }
    }
}

#[async_trait]
impl DashboardService for DashboardServiceImpl {
    async fn try_get_dashboard_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<DashboardSummary> {
        let today = now.date();
        if filter.is_unfiltered() {
            log::debug!("Dashboard stats: precomputed path");
            return self.views.dashboard_summary(today).await;
        }

        log::debug!("Dashboard stats: filtered path for {:?}", filter);
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_query(), VaccinationJoin::none(), None)
            .await?;
        Ok(aggregation::summarize(&records, today))
    }

    async fn try_get_vaccination_trend(
        &self,
        filter: &CanonicalFilter,
        days: u32,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<TrendPoint>> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(DomainError::Validation(ValidationError::range("days", 1, MAX_TREND_DAYS)));
        }
        let today = now.date();

        // The window always ends today, so date bounds never pick the path
        if !filter.has_place_or_vaccine() {
            log::debug!("Vaccination trend: precomputed path, {} days", days);
            return self.views.daily_trend(days, today).await;
        }

        log::debug!("Vaccination trend: filtered path, {} days", days);
        let start = aggregation::trend_window_start(days, today);
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_window_query(start, today), VaccinationJoin::none(), None)
            .await?;
        Ok(aggregation::trend(&records, days, today))
    }

    async fn try_get_vaccine_type_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<VaccineTypeStat>> {
        let today = now.date();
        if filter.is_unfiltered() {
            log::debug!("Vaccine type stats: precomputed path");
            return self.views.vaccine_type_stats(today).await;
        }

        let join = VaccinationJoin {
            vaccine_type: true,
            ..VaccinationJoin::none()
        };
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_query(), join, None)
            .await?;
        Ok(aggregation::vaccine_type_breakdown(&records, today))
    }

    async fn try_get_district_stats(&self, filter: &CanonicalFilter) -> DomainResult<Vec<DistrictStat>> {
        if filter.is_unfiltered() {
            log::debug!("District stats: precomputed path");
            return self.views.district_stats().await;
        }

        let join = VaccinationJoin {
            district: true,
            ..VaccinationJoin::none()
        };
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_query(), join, None)
            .await?;
        Ok(aggregation::district_breakdown(&records))
    }

    async fn try_get_age_group_stats(
        &self,
        filter: &CanonicalFilter,
        now: NaiveDateTime,
    ) -> DomainResult<Vec<AgeGroupStat>> {
        if filter.is_unfiltered() {
            log::debug!("Age group stats: precomputed path");
            return self.views.age_group_stats(now).await;
        }

        let join = VaccinationJoin {
            beneficiary: true,
            ..VaccinationJoin::none()
        };
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_query(), join, None)
            .await?;
        Ok(aggregation::age_group_breakdown(&records, now))
    }

    async fn try_get_recent_vaccinations(
        &self,
        filter: &CanonicalFilter,
        limit: u32,
    ) -> DomainResult<Vec<RecentVaccination>> {
        let records = self
            .vaccination_repo
            .query_vaccinations(&filter.to_query(), VaccinationJoin::all(), Some(limit))
            .await?;
        Ok(aggregation::recent_from_records(records))
    }
}
