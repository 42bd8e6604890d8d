use crate::domains::dashboard::types::{DistrictCoverage, MonthlyActivity, VaccineDoseSummary};
use crate::domains::vaccination::VaccinationQuery;
use crate::errors::DomainResult;
use crate::validation::common;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filters applied to every report kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub district_id: Option<Uuid>,
}

impl ReportFilters {
    /// Parse filter-form values; empty strings mean "not set".
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        district_id: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            start_date: common::parse_optional_date(start_date, "start_date")?,
            end_date: common::parse_optional_date(end_date, "end_date")?,
            district_id: common::parse_optional_uuid(district_id, "district_id")?,
        })
    }

    pub fn to_query(&self) -> VaccinationQuery {
        VaccinationQuery {
            date_from: self.start_date,
            date_to: self.end_date,
            district_id: self.district_id,
            vaccine_type_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Summary,
    Coverage,
    Monthly,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Summary, ReportKind::Coverage, ReportKind::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Coverage => "coverage",
            ReportKind::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "summary" => Some(ReportKind::Summary),
            "coverage" => Some(ReportKind::Coverage),
            "monthly" => Some(ReportKind::Monthly),
            _ => None,
        }
    }
}

/// A generated report with the rows of its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "lowercase")]
pub enum Report {
    Summary(Vec<VaccineDoseSummary>),
    Coverage(Vec<DistrictCoverage>),
    Monthly(Vec<MonthlyActivity>),
}

/// Flat string table ready for delimited-text export or print
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

const SUMMARY_HEADERS: [&str; 6] = ["Vaccine", "Total Doses", "Dose 1", "Dose 2", "Dose 3", "Dose 4"];
const COVERAGE_HEADERS: [&str; 5] = [
    "District",
    "Target Population",
    "Total Vaccinations",
    "Unique Beneficiaries",
    "Coverage %",
];
const MONTHLY_HEADERS: [&str; 5] = ["Month", "Total Vaccinations", "Unique Beneficiaries", "Male", "Female"];

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Summary(_) => ReportKind::Summary,
            Report::Coverage(_) => ReportKind::Coverage,
            Report::Monthly(_) => ReportKind::Monthly,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Report::Summary(_) => "Vaccination Summary Report",
            Report::Coverage(_) => "District Coverage Report",
            Report::Monthly(_) => "Monthly Activity Report",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Report::Summary(rows) => rows.is_empty(),
            Report::Coverage(rows) => rows.is_empty(),
            Report::Monthly(rows) => rows.is_empty(),
        }
    }

    pub fn to_table(&self) -> ReportTable {
        match self {
            Report::Summary(rows) => ReportTable {
                headers: SUMMARY_HEADERS.to_vec(),
                rows: rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.vaccine_name.clone(),
                            r.total_doses.to_string(),
                            r.dose_1.to_string(),
                            r.dose_2.to_string(),
                            r.dose_3.to_string(),
                            r.dose_4.to_string(),
                        ]
                    })
                    .collect(),
            },
            Report::Coverage(rows) => ReportTable {
                headers: COVERAGE_HEADERS.to_vec(),
                rows: rows
                    .iter()
                    .map(|r| {
                        vec![
                            r.district_name.clone(),
                            r.target_population.to_string(),
                            r.total_vaccinations.to_string(),
                            r.unique_beneficiaries.to_string(),
                            format!("{:.2}%", r.coverage_percentage),
                        ]
                    })
                    .collect(),
            },
            Report::Monthly(rows) => ReportTable {
                headers: MONTHLY_HEADERS.to_vec(),
                rows: rows
                    .iter()
                    .map(|r| {
                        vec![
                            month_label(&r.month),
                            r.total_vaccinations.to_string(),
                            r.unique_beneficiaries.to_string(),
                            r.male_count.to_string(),
                            r.female_count.to_string(),
                        ]
                    })
                    .collect(),
            },
        }
    }

    /// Download name, e.g. `coverage_report_2024-06-15.csv`.
    pub fn file_name(&self, today: NaiveDate) -> String {
        format!("{}_report_{}.csv", self.kind().as_str(), today.format("%Y-%m-%d"))
    }
}

/// "2024-01" -> "January 2024"; anything unparseable is shown as is.
fn month_label(month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}
