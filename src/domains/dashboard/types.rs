use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named date-range choices on the dashboard filter bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRangePreset {
    #[default]
    All,
    Today,
    Week,
    Month,
    Custom,
}

impl DateRangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRangePreset::All => "all",
            DateRangePreset::Today => "today",
            DateRangePreset::Week => "week",
            DateRangePreset::Month => "month",
            DateRangePreset::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(DateRangePreset::All),
            "today" => Some(DateRangePreset::Today),
            "week" => Some(DateRangePreset::Week),
            "month" => Some(DateRangePreset::Month),
            "custom" => Some(DateRangePreset::Custom),
            _ => None,
        }
    }
}

/// What the user picked on the filter bar. Custom bounds are only read
/// when the preset is `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub preset: DateRangePreset,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub district_id: Option<Uuid>,
    pub vaccine_type_id: Option<Uuid>,
}

impl FilterSelection {
    /// Number of active filters shown on the filter badge.
    pub fn active_filter_count(&self) -> usize {
        let mut count = 0;
        if self.preset != DateRangePreset::All {
            count += 1;
        }
        if self.district_id.is_some() {
            count += 1;
        }
        if self.vaccine_type_id.is_some() {
            count += 1;
        }
        count
    }
}

/// Normalized filter with absolute, inclusive date bounds. Every field is
/// always present; `None` means "no restriction".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub district_id: Option<Uuid>,
    pub vaccine_type_id: Option<Uuid>,
}

impl CanonicalFilter {
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// True when nothing narrows the data set, which selects the precomputed path.
    pub fn is_unfiltered(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.district_id.is_none()
            && self.vaccine_type_id.is_none()
    }

    pub fn has_place_or_vaccine(&self) -> bool {
        self.district_id.is_some() || self.vaccine_type_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_vaccinations: i64,
    pub today_count: i64,
    pub week_count: i64,
    pub month_count: i64,
    /// Only filled on the precomputed path
    pub total_beneficiaries: i64,
    /// Only filled on the precomputed path
    pub total_districts: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineTypeStat {
    pub vaccine_name: String,
    pub total_count: i64,
    pub week_count: i64,
    pub today_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictStat {
    pub district_name: String,
    pub target_population: i64,
    pub total_vaccinations: i64,
    pub coverage_percentage: f64,
}

/// The four fixed age buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "0-1 years")]
    UnderOne,
    #[serde(rename = "1-2 years")]
    OneToTwo,
    #[serde(rename = "2-5 years")]
    TwoToFive,
    #[serde(rename = "5+ years")]
    FiveAndOver,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::UnderOne,
        AgeGroup::OneToTwo,
        AgeGroup::TwoToFive,
        AgeGroup::FiveAndOver,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::UnderOne => "0-1 years",
            AgeGroup::OneToTwo => "1-2 years",
            AgeGroup::TwoToFive => "2-5 years",
            AgeGroup::FiveAndOver => "5+ years",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.label() == label)
    }

    /// Half-open buckets: [0,1), [1,2), [2,5), [5,inf). Negative ages count as under one.
    pub fn classify(age_years: f64) -> Self {
        if age_years < 1.0 {
            AgeGroup::UnderOne
        } else if age_years < 2.0 {
            AgeGroup::OneToTwo
        } else if age_years < 5.0 {
            AgeGroup::TwoToFive
        } else {
            AgeGroup::FiveAndOver
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeGroupStat {
    pub age_group: AgeGroup,
    pub count: i64,
}

/// Row of the recent vaccinations widget. Missing names are already
/// replaced for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentVaccination {
    pub id: Uuid,
    pub beneficiary_name: String,
    pub vaccine_name: String,
    pub dose_number: i64,
    pub date_given: NaiveDate,
    pub district_name: String,
    pub block_name: String,
    pub village: Option<String>,
    pub administered_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One dashboard section. `failed` separates a store failure from a
/// genuinely empty result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section<T> {
    pub data: T,
    pub failed: bool,
}

impl<T: Default> Section<T> {
    pub fn from_result<E: std::fmt::Display>(section: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self { data, failed: false },
            Err(e) => {
                log::error!("Dashboard section '{}' failed: {}", section, e);
                Self {
                    data: T::default(),
                    failed: true,
                }
            }
        }
    }
}

/// Everything the dashboard screen shows, loaded in one go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub filter: CanonicalFilter,
    pub summary: Section<Option<DashboardSummary>>,
    pub trend: Section<Vec<TrendPoint>>,
    pub vaccine_types: Section<Vec<VaccineTypeStat>>,
    pub districts: Section<Vec<DistrictStat>>,
    pub age_groups: Section<Vec<AgeGroupStat>>,
    pub recent: Section<Vec<RecentVaccination>>,
}

impl DashboardSnapshot {
    pub fn any_failed(&self) -> bool {
        self.summary.failed
            || self.trend.failed
            || self.vaccine_types.failed
            || self.districts.failed
            || self.age_groups.failed
            || self.recent.failed
    }
}

// Rows consumed by the report builder

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineDoseSummary {
    pub vaccine_name: String,
    pub total_doses: i64,
    pub dose_1: i64,
    pub dose_2: i64,
    pub dose_3: i64,
    pub dose_4: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictCoverage {
    pub district_name: String,
    pub target_population: i64,
    pub total_vaccinations: i64,
    pub unique_beneficiaries: i64,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    /// `YYYY-MM`
    pub month: String,
    pub total_vaccinations: i64,
    pub unique_beneficiaries: i64,
    pub male_count: i64,
    pub female_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter_count() {
        let mut selection = FilterSelection::default();
        assert_eq!(selection.active_filter_count(), 0);
        selection.preset = DateRangePreset::Week;
        selection.vaccine_type_id = Some(Uuid::new_v4());
        assert_eq!(selection.active_filter_count(), 2);
        selection.district_id = Some(Uuid::new_v4());
        assert_eq!(selection.active_filter_count(), 3);
    }

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::classify(-0.5), AgeGroup::UnderOne);
        assert_eq!(AgeGroup::classify(0.0), AgeGroup::UnderOne);
        assert_eq!(AgeGroup::classify(0.999), AgeGroup::UnderOne);
        assert_eq!(AgeGroup::classify(1.0), AgeGroup::OneToTwo);
        assert_eq!(AgeGroup::classify(2.0), AgeGroup::TwoToFive);
        assert_eq!(AgeGroup::classify(4.99), AgeGroup::TwoToFive);
        assert_eq!(AgeGroup::classify(5.0), AgeGroup::FiveAndOver);
        assert_eq!(AgeGroup::from_label("2-5 years"), Some(AgeGroup::TwoToFive));
        assert_eq!(AgeGroup::from_label("teen"), None);
    }

    #[test]
    fn test_age_group_serializes_as_label() {
        let stat = AgeGroupStat { age_group: AgeGroup::FiveAndOver, count: 3 };
        let json = serde_json::to_string(&stat).unwrap();
        assert_eq!(json, r#"{"age_group":"5+ years","count":3}"#);
    }

    #[test]
    fn test_preset_strings() {
        for preset in [
            DateRangePreset::All,
            DateRangePreset::Today,
            DateRangePreset::Week,
            DateRangePreset::Month,
            DateRangePreset::Custom,
        ] {
            assert_eq!(DateRangePreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(DateRangePreset::from_str("year"), None);
    }

    #[test]
    fn test_section_marks_failure() {
        let ok: Section<Vec<i32>> = Section::from_result("trend", Ok::<_, String>(vec![1]));
        assert!(!ok.failed);
        let failed: Section<Vec<i32>> = Section::from_result("trend", Err("store down".to_string()));
        assert!(failed.failed);
        assert!(failed.data.is_empty());
    }
}
