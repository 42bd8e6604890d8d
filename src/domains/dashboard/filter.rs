use crate::domains::dashboard::types::{CanonicalFilter, DateRangePreset, FilterSelection};
use crate::domains::vaccination::VaccinationQuery;
use chrono::{Duration, NaiveDate};

pub const WEEK_DAYS: i64 = 7;
pub const MONTH_DAYS: i64 = 30;

/// Resolve a filter-bar selection into absolute date bounds. `today` is the
/// caller's local calendar date.
pub fn normalize(selection: &FilterSelection, today: NaiveDate) -> CanonicalFilter {
    let (start_date, end_date) = match selection.preset {
        DateRangePreset::All => (None, None),
        DateRangePreset::Today => (Some(today), Some(today)),
        DateRangePreset::Week => (Some(today - Duration::days(WEEK_DAYS)), Some(today)),
        DateRangePreset::Month => (Some(today - Duration::days(MONTH_DAYS)), Some(today)),
        DateRangePreset::Custom => {
            if let (Some(start), Some(end)) = (selection.start_date, selection.end_date) {
                if start > end {
                    // Passed through as given; the query simply matches nothing
                    log::warn!("Custom date range is inverted: {} > {}", start, end);
                }
            }
            (selection.start_date, selection.end_date)
        }
    };

    CanonicalFilter {
        start_date,
        end_date,
        district_id: selection.district_id,
        vaccine_type_id: selection.vaccine_type_id,
    }
}

/// Field-by-field merge: a field set in `overlay` wins, otherwise `base` is kept.
pub fn merge(base: &CanonicalFilter, overlay: &CanonicalFilter) -> CanonicalFilter {
    CanonicalFilter {
        start_date: overlay.start_date.or(base.start_date),
        end_date: overlay.end_date.or(base.end_date),
        district_id: overlay.district_id.or(base.district_id),
        vaccine_type_id: overlay.vaccine_type_id.or(base.vaccine_type_id),
    }
}

impl CanonicalFilter {
    /// The store query matching this filter.
    pub fn to_query(&self) -> VaccinationQuery {
        VaccinationQuery {
            date_from: self.start_date,
            date_to: self.end_date,
            district_id: self.district_id,
            vaccine_type_id: self.vaccine_type_id,
        }
    }

    /// Store query for a trend window: the window replaces any date bounds.
    pub fn to_window_query(&self, window_start: NaiveDate, window_end: NaiveDate) -> VaccinationQuery {
        VaccinationQuery {
            date_from: Some(window_start),
            date_to: Some(window_end),
            district_id: self.district_id,
            vaccine_type_id: self.vaccine_type_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn selection(preset: DateRangePreset) -> FilterSelection {
        FilterSelection {
            preset,
            ..Default::default()
        }
    }

    #[test]
    fn test_presets() {
        let all = normalize(&selection(DateRangePreset::All), today());
        assert!(all.is_unfiltered());

        let day = normalize(&selection(DateRangePreset::Today), today());
        assert_eq!(day.start_date, Some(today()));
        assert_eq!(day.end_date, Some(today()));

        let week = normalize(&selection(DateRangePreset::Week), today());
        assert_eq!(week.start_date, NaiveDate::from_ymd_opt(2024, 2, 27));
        assert_eq!(week.end_date, Some(today()));

        // Crosses the leap day
        let month = normalize(&selection(DateRangePreset::Month), today());
        assert_eq!(month.start_date, NaiveDate::from_ymd_opt(2024, 2, 4));
    }

    #[test]
    fn test_custom_passes_bounds_through() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let district = Uuid::new_v4();
        let custom = FilterSelection {
            preset: DateRangePreset::Custom,
            start_date: Some(start),
            end_date: Some(end),
            district_id: Some(district),
            vaccine_type_id: None,
        };
        let filter = normalize(&custom, today());
        assert_eq!(filter.start_date, Some(start));
        assert_eq!(filter.end_date, Some(end));
        assert_eq!(filter.district_id, Some(district));
        assert!(!filter.is_unfiltered());
    }

    #[test]
    fn test_custom_bounds_ignored_for_named_presets() {
        let mut week = selection(DateRangePreset::Week);
        week.start_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let filter = normalize(&week, today());
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 2, 27));
    }

    #[test]
    fn test_merge_overlay_wins_per_field() {
        let district = Uuid::new_v4();
        let vaccine = Uuid::new_v4();
        let base = CanonicalFilter {
            start_date: Some(today()),
            end_date: Some(today()),
            district_id: Some(district),
            vaccine_type_id: None,
        };
        let overlay = CanonicalFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            vaccine_type_id: Some(vaccine),
            ..Default::default()
        };
        let merged = merge(&base, &overlay);
        assert_eq!(merged.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(merged.end_date, Some(today()));
        assert_eq!(merged.district_id, Some(district));
        assert_eq!(merged.vaccine_type_id, Some(vaccine));
        assert_eq!(merge(&base, &CanonicalFilter::unfiltered()), base);
    }

    #[test]
    fn test_window_query_replaces_dates() {
        let filter = normalize(&selection(DateRangePreset::Month), today());
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let query = filter.to_window_query(start, today());
        assert_eq!(query.date_from, Some(start));
        assert_eq!(query.date_to, Some(today()));
    }
}
