// Public modules
pub mod auth;
pub mod config;
pub mod context;
pub mod domains;
pub mod errors;
pub mod types;
pub mod validation;

// Private modules
mod db_migration;

#[cfg(test)]
pub mod test_support;

pub use config::AppConfig;
pub use context::AppContext;

/// Load `AppConfig` from the environment (and `.env`) and initialize the
/// library with it. Call `AppContext::teardown` on shutdown.
pub async fn initialize_from_env() -> errors::ServiceResult<AppContext> {
    let config = AppConfig::from_env()?;
    AppContext::initialize(config).await
}
