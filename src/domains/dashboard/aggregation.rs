//! In-process aggregation over fetched vaccination rows.
//!
//! These functions back the filtered dashboard path and the report builder.
//! The precomputed path shares `coverage_percentage`, `zero_filled_trend`,
//! `age_groups_from_counts` and the sort helpers so both paths order and
//! round identically.

use crate::domains::dashboard::filter::{MONTH_DAYS, WEEK_DAYS};
use crate::domains::dashboard::types::{
    AgeGroup, AgeGroupStat, DashboardSummary, DistrictCoverage, DistrictStat, MonthlyActivity,
    RecentVaccination, TrendPoint, VaccineDoseSummary, VaccineTypeStat,
};
use crate::domains::reference::District;
use crate::domains::vaccination::VaccinationRecord;
use crate::types::{PaginatedResult, PaginationParams};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const DAYS_PER_YEAR: f64 = 365.25;
/// Districts shown in the dashboard's top list
pub const TOP_DISTRICTS: usize = 5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Two-decimal coverage percentage; zero when the target population is zero.
pub fn coverage_percentage(total_vaccinations: i64, target_population: i64) -> f64 {
    if target_population <= 0 {
        return 0.0;
    }
    ((total_vaccinations as f64 / target_population as f64) * 10_000.0).round() / 100.0
}

/// Age in fractional years at `now`, counting from midnight of the birth date.
pub fn age_in_years(date_of_birth: NaiveDate, now: NaiveDateTime) -> f64 {
    let born = date_of_birth.and_time(chrono::NaiveTime::MIN);
    let seconds = (now - born).num_seconds() as f64;
    seconds / (DAYS_PER_YEAR * SECONDS_PER_DAY)
}

/// First day of the trailing `days`-day window ending at `today`, clamped to
/// the earliest representable date.
pub fn trend_window_start(days: u32, today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(i64::from(days.max(1)) - 1))
        .unwrap_or(NaiveDate::MIN)
}

pub fn summarize(records: &[VaccinationRecord], today: NaiveDate) -> DashboardSummary {
    let week_start = today - Duration::days(WEEK_DAYS);
    let month_start = today - Duration::days(MONTH_DAYS);

    let mut summary = DashboardSummary {
        total_vaccinations: records.len() as i64,
        ..Default::default()
    };
    // The three windows overlap: a dose given today counts in all of them
    for record in records {
        let date = record.vaccination.date_given;
        if date == today {
            summary.today_count += 1;
        }
        if date >= week_start {
            summary.week_count += 1;
        }
        if date >= month_start {
            summary.month_count += 1;
        }
    }
    summary
}

/// One point per day in `[today - (days - 1), today]`, ascending, zero-filled.
/// Counts dated outside the window are dropped.
pub fn zero_filled_trend<I>(daily_counts: I, days: u32, today: NaiveDate) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = (NaiveDate, i64)>,
{
    let start = trend_window_start(days, today);
    let mut buckets: BTreeMap<NaiveDate, i64> = start
        .iter_days()
        .take(days as usize)
        .map(|date| (date, 0))
        .collect();

    let mut dropped = 0;
    for (date, count) in daily_counts {
        match buckets.get_mut(&date) {
            Some(bucket) => *bucket += count,
            None => dropped += count,
        }
    }
    if dropped > 0 {
        log::warn!("Dropped {} vaccinations outside the trend window starting {}", dropped, start);
    }

    buckets
        .into_iter()
        .map(|(date, count)| TrendPoint { date, count })
        .collect()
}

pub fn trend(records: &[VaccinationRecord], days: u32, today: NaiveDate) -> Vec<TrendPoint> {
    zero_filled_trend(
        records.iter().map(|r| (r.vaccination.date_given, 1)),
        days,
        today,
    )
}

/// Descending total, then name ascending.
pub fn sort_vaccine_stats(stats: &mut [VaccineTypeStat]) {
    stats.sort_by(|a, b| {
        b.total_count
            .cmp(&a.total_count)
            .then_with(|| a.vaccine_name.cmp(&b.vaccine_name))
    });
}

pub fn vaccine_type_breakdown(records: &[VaccinationRecord], today: NaiveDate) -> Vec<VaccineTypeStat> {
    let week_start = today - Duration::days(WEEK_DAYS);
    let mut by_name: HashMap<String, VaccineTypeStat> = HashMap::new();

    for record in records {
        let name = record.vaccine_name.as_deref().unwrap_or(UNKNOWN_LABEL);
        let stat = by_name.entry(name.to_string()).or_insert_with(|| VaccineTypeStat {
            vaccine_name: name.to_string(),
            total_count: 0,
            week_count: 0,
            today_count: 0,
        });
        let date = record.vaccination.date_given;
        stat.total_count += 1;
        if date >= week_start {
            stat.week_count += 1;
        }
        if date == today {
            stat.today_count += 1;
        }
    }

    let mut stats: Vec<VaccineTypeStat> = by_name.into_values().collect();
    sort_vaccine_stats(&mut stats);
    stats
}

/// Descending total vaccinations, then name ascending.
pub fn sort_district_stats(stats: &mut [DistrictStat]) {
    stats.sort_by(|a, b| {
        b.total_vaccinations
            .cmp(&a.total_vaccinations)
            .then_with(|| a.district_name.cmp(&b.district_name))
    });
}

pub fn district_stat(district_name: String, target_population: i64, total_vaccinations: i64) -> DistrictStat {
    DistrictStat {
        coverage_percentage: coverage_percentage(total_vaccinations, target_population),
        district_name,
        target_population,
        total_vaccinations,
    }
}

/// Groups by district name. Districts sharing a name share one row and
/// use the largest target population among them.
pub fn district_breakdown(records: &[VaccinationRecord]) -> Vec<DistrictStat> {
    let mut by_name: HashMap<String, (i64, i64)> = HashMap::new();

    for record in records {
        let name = record.district_name.as_deref().unwrap_or(UNKNOWN_LABEL);
        let target = record.district_target_population.unwrap_or(0);
        let entry = by_name.entry(name.to_string()).or_insert((target, 0));
        entry.0 = entry.0.max(target);
        entry.1 += 1;
    }

    let mut stats: Vec<DistrictStat> = by_name
        .into_iter()
        .map(|(name, (target, total))| district_stat(name, target, total))
        .collect();
    sort_district_stats(&mut stats);
    stats
}

/// All four buckets in display order; missing buckets count zero.
pub fn age_groups_from_counts(counts: &HashMap<AgeGroup, i64>) -> Vec<AgeGroupStat> {
    AgeGroup::ALL
        .into_iter()
        .map(|age_group| AgeGroupStat {
            age_group,
            count: counts.get(&age_group).copied().unwrap_or(0),
        })
        .collect()
}

pub fn age_group_breakdown(records: &[VaccinationRecord], now: NaiveDateTime) -> Vec<AgeGroupStat> {
    let mut counts: HashMap<AgeGroup, i64> = HashMap::new();
    for record in records {
        match record.beneficiary_date_of_birth {
            Some(dob) => *counts.entry(AgeGroup::classify(age_in_years(dob, now))).or_insert(0) += 1,
            None => log::warn!(
                "Vaccination {} has no beneficiary date of birth; left out of age groups",
                record.vaccination.id
            ),
        }
    }
    age_groups_from_counts(&counts)
}

/// Display rows for the recent vaccinations widget.
pub fn recent_from_records(records: Vec<VaccinationRecord>) -> Vec<RecentVaccination> {
    records
        .into_iter()
        .map(|record| RecentVaccination {
            id: record.vaccination.id,
            beneficiary_name: record.beneficiary_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            vaccine_name: record.vaccine_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            dose_number: record.vaccination.dose_number,
            date_given: record.vaccination.date_given,
            district_name: record.district_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            block_name: record.block_name.unwrap_or_default(),
            village: record.vaccination.village,
            administered_by: record.vaccination.administered_by,
            created_at: record.vaccination.created_at,
        })
        .collect()
}

/// One client-side page of an already fetched recent list.
pub fn paginate_recent(items: &[RecentVaccination], page: u32, page_size: u32) -> PaginatedResult<RecentVaccination> {
    PaginatedResult::from_slice(items, PaginationParams::new(page.max(1), page_size))
}

/// The `n` districts with the most vaccinations.
pub fn top_districts(stats: &[DistrictStat], n: usize) -> Vec<DistrictStat> {
    let mut sorted = stats.to_vec();
    sort_district_stats(&mut sorted);
    sorted.truncate(n);
    sorted
}

/// Per-vaccine dose counts. Doses past the fourth count only toward the total.
pub fn vaccine_dose_summary(records: &[VaccinationRecord]) -> Vec<VaccineDoseSummary> {
    let mut by_name: BTreeMap<String, VaccineDoseSummary> = BTreeMap::new();
    for record in records {
        let name = record.vaccine_name.as_deref().unwrap_or(UNKNOWN_LABEL);
        let row = by_name.entry(name.to_string()).or_insert_with(|| VaccineDoseSummary {
            vaccine_name: name.to_string(),
            total_doses: 0,
            dose_1: 0,
            dose_2: 0,
            dose_3: 0,
            dose_4: 0,
        });
        row.total_doses += 1;
        match record.vaccination.dose_number {
            1 => row.dose_1 += 1,
            2 => row.dose_2 += 1,
            3 => row.dose_3 += 1,
            4 => row.dose_4 += 1,
            _ => {}
        }
    }
    by_name.into_values().collect()
}

/// Coverage for each of `districts`, including those with no vaccinations, by name.
pub fn district_coverage(records: &[VaccinationRecord], districts: &[District]) -> Vec<DistrictCoverage> {
    let mut totals: HashMap<Uuid, (i64, HashSet<Uuid>)> = HashMap::new();
    for record in records {
        let entry = totals.entry(record.vaccination.district_id).or_default();
        entry.0 += 1;
        entry.1.insert(record.vaccination.beneficiary_id);
    }

    let mut rows: Vec<DistrictCoverage> = districts
        .iter()
        .map(|district| {
            let (total, beneficiaries) = totals
                .get(&district.id)
                .map(|(total, set)| (*total, set.len() as i64))
                .unwrap_or((0, 0));
            DistrictCoverage {
                district_name: district.name.clone(),
                target_population: district.target_population,
                total_vaccinations: total,
                unique_beneficiaries: beneficiaries,
                coverage_percentage: coverage_percentage(total, district.target_population),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.district_name.cmp(&b.district_name));
    rows
}

/// Activity per calendar month of `date_given`, oldest first. The gender
/// counts are distinct beneficiaries, like `unique_beneficiaries`.
pub fn monthly_activity(records: &[VaccinationRecord]) -> Vec<MonthlyActivity> {
    #[derive(Default)]
    struct MonthAccumulator {
        total: i64,
        beneficiaries: HashSet<Uuid>,
        male: HashSet<Uuid>,
        female: HashSet<Uuid>,
    }

    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
    for record in records {
        let key = record.vaccination.date_given.format("%Y-%m").to_string();
        let acc = months.entry(key).or_default();
        let beneficiary_id = record.vaccination.beneficiary_id;
        acc.total += 1;
        acc.beneficiaries.insert(beneficiary_id);
        match record.beneficiary_gender.as_deref() {
            Some("male") => {
                acc.male.insert(beneficiary_id);
            }
            Some("female") => {
                acc.female.insert(beneficiary_id);
            }
            _ => {}
        }
    }

    months
        .into_iter()
        .map(|(month, acc)| MonthlyActivity {
            month,
            total_vaccinations: acc.total,
            unique_beneficiaries: acc.beneficiaries.len() as i64,
            male_count: acc.male.len() as i64,
            female_count: acc.female.len() as i64,
        })
        .collect()
}
