use crate::errors::DomainResult;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite, query_as};
use uuid::Uuid;
use std::collections::HashMap;
use crate::errors::DbError;
use crate::errors::DomainError;

/// Dependency information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the table with dependent records
    pub table_name: String,

    /// Count of dependent records
    pub count: i64,

    /// Name of the foreign key column
    pub foreign_key_column: String,

    /// Whether the dependency is cascadable (ON DELETE CASCADE / SET NULL)
    pub is_cascadable: bool,
}

/// Trait for dependency checking
#[async_trait]
pub trait DependencyChecker: Send + Sync {
    /// Check for dependencies for an entity
    async fn check_dependencies(&self, table_name: &str, id: Uuid) -> DomainResult<Vec<Dependency>>;

    /// Names of the tables whose records block deleting the entity
    async fn get_blocking_tables(&self, table_name: &str, id: Uuid) -> DomainResult<Vec<String>> {
        let dependencies = self.check_dependencies(table_name, id).await?;
        Ok(dependencies
            .into_iter()
            .filter(|dep| !dep.is_cascadable && dep.count > 0)
            .map(|dep| dep.table_name)
            .collect())
    }
}

/// SQLite implementation of the DependencyChecker
pub struct SqliteDependencyChecker {
    pool: Pool<Sqlite>,
    /// Maps table name to the tables referencing it
    dependency_map: HashMap<String, Vec<(String, String, bool)>>,
}

impl SqliteDependencyChecker {
    /// Create a new SQLite dependency checker
    pub fn new(pool: Pool<Sqlite>) -> Self {
        let mut dependency_map = HashMap::new();

        // Format: (table_name, [(dependent_table, foreign_key_column, is_cascadable)])

        // A beneficiary cannot go while doses reference it
        dependency_map.insert(
            "beneficiaries".to_string(),
            vec![
                ("vaccinations".to_string(), "beneficiary_id".to_string(), false),
            ]
        );

        // Vaccinations are leaf records: no entry. Reference data is never deleted.

        Self { pool, dependency_map }
    }
}

/// Query result for dependency count
#[derive(Debug, sqlx::FromRow)]
struct DependencyCount {
    count: i64,
}

#[async_trait]
impl DependencyChecker for SqliteDependencyChecker {
    async fn check_dependencies(&self, table_name: &str, id: Uuid) -> DomainResult<Vec<Dependency>> {
        let mut dependencies = Vec::new();
        let id_str = id.to_string();

        if let Some(dependent_tables) = self.dependency_map.get(table_name) {
            for (dependent_table, foreign_key, is_cascadable) in dependent_tables {
                let query = format!(
                    "SELECT COUNT(*) as count FROM {} WHERE {} = ?",
                    dependent_table,
                    foreign_key
                );

                let count_result: Result<DependencyCount, sqlx::Error> = query_as(&query)
                    .bind(&id_str)
                    .fetch_one(&self.pool)
                    .await;

                let count = match count_result {
                    Ok(c) => c.count,
                    Err(sqlx::Error::RowNotFound) => 0,
                    Err(e) => return Err(DomainError::Database(DbError::from(e))),
                };

                if count > 0 {
                    dependencies.push(Dependency {
                        table_name: dependent_table.clone(),
                        count,
                        foreign_key_column: foreign_key.clone(),
                        is_cascadable: *is_cascadable,
                    });
                }
            }
        }

        Ok(dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Fixture};

    #[tokio::test]
    async fn test_beneficiary_with_doses_is_blocked() {
        let fixture = Fixture::new().await;
        let checker = SqliteDependencyChecker::new(fixture.pool.clone());

        assert!(checker
            .get_blocking_tables("beneficiaries", fixture.child.id)
            .await
            .unwrap()
            .is_empty());

        fixture
            .vaccinate(fixture.bcg.id, 1, test_support::fixed_today(), fixture.district_a.id)
            .await;
        fixture
            .vaccinate(fixture.opv.id, 1, test_support::fixed_today(), fixture.district_a.id)
            .await;

        let dependencies = checker
            .check_dependencies("beneficiaries", fixture.child.id)
            .await
            .unwrap();
        assert_eq!(dependencies.len(), 1);
        assert_eq!(dependencies[0].table_name, "vaccinations");
        assert_eq!(dependencies[0].count, 2);
        assert_eq!(
            checker.get_blocking_tables("beneficiaries", fixture.child.id).await.unwrap(),
            vec!["vaccinations".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unmapped_table_has_no_dependencies() {
        let fixture = Fixture::new().await;
        let checker = SqliteDependencyChecker::new(fixture.pool.clone());

        assert!(checker
            .check_dependencies("vaccinations", fixture.child.id)
            .await
            .unwrap()
            .is_empty());
    }
}
