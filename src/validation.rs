use crate::errors::{ValidationError, DomainResult, DomainError};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("phone pattern compiles"))
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Collects errors from several builders and reports the first one.
pub struct NestedValidator {
    errors: Vec<ValidationError>,
}

impl NestedValidator {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn check(&mut self, result: DomainResult<()>) {
        if let Err(DomainError::Validation(err)) = result {
            self.errors.push(err);
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

impl Default for NestedValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self
    where T: Default + PartialEq {
        if self.value.is_none() || self.value == Some(T::default()) {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            // Return the first error for simplicity
            Some(first) => Err(DomainError::Validation(first)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn not_blank(mut self) -> Self {
        if let Some(value) = &self.value {
            if value.trim().is_empty() {
                self.errors.push(ValidationError::required(&self.field_name));
            }
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.chars().count() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn phone(self) -> Self {
        self.matches_pattern(phone_regex(), "must be a valid phone number")
    }

    pub fn one_of(mut self, allowed_values: &[&str], message: Option<&str>) -> Self {
        if let Some(value) = &self.value {
            if !allowed_values.contains(&value.as_str()) {
                let reason = message.unwrap_or("must be one of the allowed values");
                self.errors.push(ValidationError::invalid_value(&self.field_name, reason));
            }
        }
        self
    }
}

/// Numeric validations
impl<T> ValidationBuilder<T>
where T: PartialOrd + Clone + std::fmt::Display
{
    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = &self.value {
            if value < &min || value > &max {
                self.errors.push(ValidationError::range(
                    &self.field_name,
                    min.to_string(),
                    max.to_string()
                ));
            }
        }
        self
    }
}

/// Calendar date validation helpers. The reference date is always passed in.
impl ValidationBuilder<NaiveDate> {
    pub fn not_after(mut self, today: NaiveDate) -> Self {
        if let Some(value) = &self.value {
            if value > &today {
                self.errors.push(ValidationError::invalid_value(
                    &self.field_name,
                    "cannot be in the future"
                ));
            }
        }
        self
    }
}

/// UUID validation helpers
impl ValidationBuilder<Uuid> {
    pub fn not_nil(mut self) -> Self {
        if let Some(value) = &self.value {
            if *value == Uuid::nil() {
                self.errors.push(ValidationError::required(&self.field_name));
            }
        }
        self
    }
}

pub mod common {
    use super::*;

    pub const GENDERS: &[&str] = &["male", "female", "other"];

    pub fn validate_gender(gender: &str) -> DomainResult<()> {
        ValidationBuilder::new("gender", Some(gender.to_string()))
            .one_of(GENDERS, Some("must be one of: male, female, other"))
            .validate()
    }

    pub fn parse_date(date_str: &str, field_name: &str) -> DomainResult<NaiveDate> {
        NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| {
            DomainError::Validation(ValidationError::format(
                field_name,
                "must be in the format YYYY-MM-DD",
            ))
        })
    }

    /// Parse an optional date field where an empty string means "not set".
    pub fn parse_optional_date(date_str: Option<&str>, field_name: &str) -> DomainResult<Option<NaiveDate>> {
        match date_str.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_date(s, field_name).map(Some),
        }
    }

    pub fn parse_uuid(value: &str, field_name: &str) -> DomainResult<Uuid> {
        Uuid::parse_str(value.trim()).map_err(|_| {
            DomainError::Validation(ValidationError::format(field_name, "must be a valid UUID"))
        })
    }

    pub fn parse_optional_uuid(value: Option<&str>, field_name: &str) -> DomainResult<Option<Uuid>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_uuid(s, field_name).map(Some),
        }
    }

    /// Parse an RFC 3339 timestamp as stored in `created_at`/`updated_at` columns.
    pub fn parse_timestamp(value: &str, field_name: &str) -> DomainResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                DomainError::Validation(ValidationError::format(
                    field_name,
                    &format!("Invalid RFC3339 format: {}", value),
                ))
            })
    }

    /// Current time in the fixed-width form used for timestamp columns, so that
    /// text ordering matches time ordering.
    pub fn timestamp_now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation() {
        assert!(phone_regex().is_match("9876543210"));
        assert!(phone_regex().is_match("+919876543210"));
        assert!(!phone_regex().is_match("123"));
        assert!(!phone_regex().is_match("abcdefghij"));
    }

    #[test]
    fn test_validation_builder() {
        let result = ValidationBuilder::new("name", Some("".to_string()))
            .required()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("name", Some("   ".to_string()))
            .not_blank()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("name", Some("Asha".to_string()))
            .required()
            .max_length(3)
            .validate();
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MaxLength { max: 3, .. }))
        ));

        let result = ValidationBuilder::new("dose_number", Some(5))
            .range(1, 4)
            .validate();
        assert!(result.is_err());

        let value: Option<String> = None;
        let result = ValidationBuilder::new("name", value)
            .required()
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("district_id", Some(Uuid::nil()))
            .not_nil()
            .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_not_after() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let tomorrow = today.succ_opt().unwrap();
        assert!(ValidationBuilder::new("date_given", Some(today)).not_after(today).validate().is_ok());
        assert!(ValidationBuilder::new("date_given", Some(tomorrow)).not_after(today).validate().is_err());
    }

    #[test]
    fn test_nested_validator_reports_first_error() {
        let mut validator = NestedValidator::new();
        validator.check(Ok(()));
        validator.check(common::validate_gender("unknown"));
        validator.add_error(ValidationError::required("district_id"));
        match validator.validate() {
            Err(DomainError::Validation(ValidationError::InvalidValue { field, .. })) => assert_eq!(field, "gender"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_common_validations() {
        assert!(common::validate_gender("male").is_ok());
        assert!(common::validate_gender("other").is_ok());
        assert!(common::validate_gender("prefer_not_to_say").is_err());

        assert!(common::parse_date("2023-01-01", "date").is_ok());
        assert!(common::parse_date("01/01/2023", "date").is_err());
        assert_eq!(common::parse_optional_date(Some(""), "date").unwrap(), None);
        assert!(common::parse_optional_date(Some("2023-13-01"), "date").is_err());

        assert!(common::parse_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        assert!(common::parse_uuid("not-a-uuid", "id").is_err());
    }
}
