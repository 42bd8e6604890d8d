use crate::domains::dashboard::service::MAX_TREND_DAYS;
use crate::errors::{ServiceError, ServiceResult};
use std::env;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://teekasetu.sqlite?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_TREND_DAYS: u32 = 7;
pub const DEFAULT_RECENT_LIMIT: u32 = 50;
pub const DEFAULT_RECENT_PAGE_SIZE: u32 = 10;

/// Application configuration, passed explicitly into `AppContext::initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub device_id: String,
    pub max_connections: u32,
    /// Length of the dashboard trend window in days
    pub trend_days: u32,
    /// How many recent vaccinations the dashboard widget fetches
    pub recent_limit: u32,
    /// Client-side page size for the recent vaccinations widget
    pub recent_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            device_id: "local".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            trend_days: DEFAULT_TREND_DAYS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            recent_page_size: DEFAULT_RECENT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> ServiceResult<Self> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            database_url: lookup("TEEKASETU_DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_url),
            device_id: lookup("TEEKASETU_DEVICE_ID")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.device_id),
            max_connections: parse_var(&lookup, "TEEKASETU_MAX_CONNECTIONS", defaults.max_connections)?,
            trend_days: parse_var(&lookup, "TEEKASETU_TREND_DAYS", defaults.trend_days)?,
            recent_limit: parse_var(&lookup, "TEEKASETU_RECENT_LIMIT", defaults.recent_limit)?,
            recent_page_size: parse_var(&lookup, "TEEKASETU_RECENT_PAGE_SIZE", defaults.recent_page_size)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(ServiceError::Configuration("database URL must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ServiceError::Configuration("max connections must be at least 1".to_string()));
        }
        if self.trend_days == 0 || self.trend_days > MAX_TREND_DAYS {
            return Err(ServiceError::Configuration(format!(
                "trend window must be between 1 and {} days",
                MAX_TREND_DAYS
            )));
        }
        if self.recent_limit == 0 || self.recent_page_size == 0 {
            return Err(ServiceError::Configuration(
                "recent vaccination limit and page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> ServiceResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ServiceError::Configuration(format!("{} has an invalid value: {}", key, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.trend_days, 7);
        assert_eq!(config.recent_limit, 50);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TEEKASETU_DATABASE_URL", "sqlite::memory:"),
            ("TEEKASETU_TREND_DAYS", "14"),
            ("TEEKASETU_RECENT_PAGE_SIZE", " 20 "),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.trend_days, 14);
        assert_eq!(config.recent_page_size, 20);
    }

    #[test]
    fn test_trend_window_is_bounded() {
        assert!(AppConfig::from_lookup(lookup_from(&[("TEEKASETU_TREND_DAYS", "366")])).is_ok());
        let result = AppConfig::from_lookup(lookup_from(&[("TEEKASETU_TREND_DAYS", "100000")]));
        assert!(matches!(result, Err(ServiceError::Configuration(_))));
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let result = AppConfig::from_lookup(lookup_from(&[("TEEKASETU_MAX_CONNECTIONS", "many")]));
        assert!(matches!(result, Err(ServiceError::Configuration(_))));

        let result = AppConfig::from_lookup(lookup_from(&[("TEEKASETU_TREND_DAYS", "0")]));
        assert!(matches!(result, Err(ServiceError::Configuration(_))));
    }
}
