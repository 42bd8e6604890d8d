use crate::errors::{DbError, DbResult};
use sqlx::SqlitePool;

// Embed all migration SQL files at compile time
const MIGRATION_REFERENCE_DATA: &str = include_str!("../migrations/20250101000000_reference_data.sql");
const MIGRATION_RECORDS: &str = include_str!("../migrations/20250101000100_records.sql");

// List of migrations with their names and SQL content
const MIGRATIONS: &[(&str, &str)] = &[
    ("20250101000000_reference_data.sql", MIGRATION_REFERENCE_DATA),
    ("20250101000100_records.sql", MIGRATION_RECORDS),
];

/// Initialize the database with migrations
pub async fn initialize_database(pool: &SqlitePool) -> DbResult<()> {
    log::info!("Starting database migration process");

    create_migrations_table(pool).await?;

    let last_migration = get_last_migration(pool).await?;
    match &last_migration {
        Some(name) => log::debug!("Last applied migration: {}", name),
        None => log::debug!("No migrations applied yet"),
    }

    apply_pending_migrations(pool, last_migration).await?;

    log::info!("Database migration process completed");
    Ok(())
}

/// Create migrations table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )"
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

/// Get the last applied migration
async fn get_last_migration(pool: &SqlitePool) -> DbResult<Option<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM migrations ORDER BY id DESC LIMIT 1"
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to get last migration: {}", e)))
}

/// Apply pending migrations inside a single transaction
async fn apply_pending_migrations(pool: &SqlitePool, last_migration: Option<String>) -> DbResult<()> {
    let pending_migrations = get_pending_migrations(last_migration.as_deref())?;

    if pending_migrations.is_empty() {
        log::debug!("No pending migrations to apply");
        return Ok(());
    }

    log::info!("Found {} pending migrations", pending_migrations.len());

    let mut tx = pool.begin().await
        .map_err(|e| DbError::Migration(format!("Failed to begin transaction: {}", e)))?;

    for (migration_name, migration_sql) in pending_migrations {
        log::debug!("Applying migration: {}", migration_name);

        sqlx::raw_sql(migration_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply migration {}: {}", migration_name, e)))?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO migrations (name, applied_at) VALUES (?, ?)"
        )
        .bind(migration_name)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::Migration(format!("Failed to record migration {}: {}", migration_name, e)))?;
    }

    tx.commit().await
        .map_err(|e| DbError::Migration(format!("Failed to commit transaction: {}", e)))?;

    Ok(())
}

/// Get the migrations that come after the last applied one
fn get_pending_migrations(last_migration: Option<&str>) -> DbResult<Vec<(&'static str, &'static str)>> {
    let start_index = match last_migration {
        None => 0,
        Some(last) => {
            let position = MIGRATIONS
                .iter()
                .position(|(name, _)| *name == last)
                .ok_or_else(|| DbError::Migration(format!("Unknown applied migration: {}", last)))?;
            position + 1
        }
    };

    Ok(MIGRATIONS[start_index..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_migrations_after_last() {
        assert_eq!(get_pending_migrations(None).unwrap().len(), MIGRATIONS.len());
        let pending = get_pending_migrations(Some("20250101000000_reference_data.sql")).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, "20250101000100_records.sql");
        assert!(get_pending_migrations(Some("20250101000100_records.sql")).unwrap().is_empty());
        assert!(get_pending_migrations(Some("bogus.sql")).is_err());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }
}
