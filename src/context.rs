use crate::config::AppConfig;
use crate::db_migration;
use crate::domains::beneficiary::{BeneficiaryService, BeneficiaryServiceImpl, SqliteBeneficiaryRepository};
use crate::domains::core::SqliteDependencyChecker;
use crate::domains::dashboard::{
    DashboardService, DashboardServiceImpl, RequestSequencer, SqliteAggregateViewRepository,
};
use crate::domains::reference::{ReferenceDataRepository, SqliteReferenceDataRepository};
use crate::domains::report::{ReportService, ReportServiceImpl};
use crate::domains::vaccination::{SqliteVaccinationRepository, VaccinationService, VaccinationServiceImpl};
use crate::errors::{DbError, ServiceResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

/// Everything a host needs after startup: the pool, the repositories behind
/// trait objects and the services built on them.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub pool: SqlitePool,
    pub reference_data: Arc<dyn ReferenceDataRepository>,
    pub beneficiary_service: Arc<dyn BeneficiaryService>,
    pub vaccination_service: Arc<dyn VaccinationService>,
    pub dashboard_service: Arc<dyn DashboardService>,
    pub report_service: Arc<dyn ReportService>,
    /// Shared by dashboard loads so only the newest result is delivered
    pub dashboard_sequencer: Arc<RequestSequencer>,
}

impl AppContext {
    pub async fn initialize(config: AppConfig) -> ServiceResult<Self> {
        // Initialize logging first
        if std::env::var("RUST_LOG").is_err() {
            #[cfg(debug_assertions)]
            std::env::set_var("RUST_LOG", "debug");
            #[cfg(not(debug_assertions))]
            std::env::set_var("RUST_LOG", "info");
        }
        let _ = env_logger::try_init();

        config.validate()?;
        log::info!("Starting initialization");
        log::debug!("Database URL: {}", config.database_url);
        log::debug!("Device ID: {}", config.device_id);

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(DbError::from)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                log::error!("Database connection failed: {}", e);
                DbError::from(e)
            })?;
        log::debug!("Database connection established");

        // Migrations before any service touches the store
        db_migration::initialize_database(&pool).await.map_err(|e| {
            log::error!("Database initialization failed: {}", e);
            e
        })?;

        let reference_repo = Arc::new(SqliteReferenceDataRepository::new(pool.clone()));
        let beneficiary_repo = Arc::new(SqliteBeneficiaryRepository::new(pool.clone()));
        let vaccination_repo = Arc::new(SqliteVaccinationRepository::new(pool.clone()));
        let views = Arc::new(SqliteAggregateViewRepository::new(pool.clone()));
        let dependency_checker = Arc::new(SqliteDependencyChecker::new(pool.clone()));

        let beneficiary_service = Arc::new(BeneficiaryServiceImpl::new(
            beneficiary_repo.clone(),
            reference_repo.clone(),
            dependency_checker,
        ));
        let vaccination_service = Arc::new(VaccinationServiceImpl::new(
            vaccination_repo.clone(),
            beneficiary_repo,
            reference_repo.clone(),
        ));
        let dashboard_service = Arc::new(DashboardServiceImpl::new(vaccination_repo.clone(), views));
        let report_service = Arc::new(ReportServiceImpl::new(vaccination_repo, reference_repo.clone()));

        log::info!("Initialization complete");
        Ok(Self {
            config,
            pool,
            reference_data: reference_repo,
            beneficiary_service,
            vaccination_service,
            dashboard_service,
            report_service,
            dashboard_sequencer: Arc::new(RequestSequencer::new()),
        })
    }

    /// Close the pool; in-flight queries finish first.
    pub async fn teardown(&self) {
        log::info!("Shutting down");
        self.pool.close().await;
    }
}
