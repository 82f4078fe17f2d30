//! Database migrations for the document store

use crate::persistence::error::PersistenceError;
use crate::persistence::pool::StorePool;
use sqlx::Row;

const MIGRATION_001_INITIAL: &str = r#"
-- Per-user generation counters
CREATE TABLE IF NOT EXISTS users (
    id VARCHAR(255) PRIMARY KEY,
    email TEXT NOT NULL,
    api_call_count BIGINT NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Saved forms, stored as canonical schema text
CREATE TABLE IF NOT EXISTS forms (
    id VARCHAR(64) PRIMARY KEY,
    user_id VARCHAR(255) NOT NULL,
    user_email TEXT NOT NULL,
    title TEXT,
    schema_text TEXT NOT NULL,
    created_at VARCHAR(64) NOT NULL
);

CREATE INDEX idx_forms_user ON forms(user_id, created_at)
"#;

const MIGRATION_002_FEEDBACK: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id VARCHAR(64) PRIMARY KEY,
    user_id VARCHAR(255),
    user_email TEXT,
    message TEXT NOT NULL,
    created_at VARCHAR(64) NOT NULL
)
"#;

struct Migration {
    name: &'static str,
    sql: &'static str,
    checksum: &'static str,
}

fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            name: "001_initial_schema",
            sql: MIGRATION_001_INITIAL,
            checksum: "v1",
        },
        Migration {
            name: "002_feedback",
            sql: MIGRATION_002_FEEDBACK,
            checksum: "v1",
        },
    ]
}

/// Applies pending migrations and records them in `_formwright_migrations`
pub struct MigrationRunner {
    pool: StorePool,
}

impl MigrationRunner {
    pub fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations
    pub async fn migrate_up(&self) -> Result<MigrationResult, PersistenceError> {
        let mut applied = 0;
        let mut skipped = 0;

        self.ensure_migrations_table().await?;

        for migration in get_migrations() {
            if self.is_migration_applied(migration.name).await? {
                tracing::debug!("Migration '{}' already applied, skipping", migration.name);
                skipped += 1;
                continue;
            }

            tracing::info!("Applying migration: {}", migration.name);

            // One statement per round trip; SQLite rejects batches through `Any`
            for statement in migration.sql.split(';') {
                let statement = strip_comments(statement);
                if statement.is_empty() {
                    continue;
                }

                sqlx::query(&statement)
                    .execute(self.pool.inner())
                    .await
                    .map_err(|e| {
                        PersistenceError::Migration(format!(
                            "Failed to execute migration '{}': {}",
                            migration.name, e
                        ))
                    })?;
            }

            self.record_migration(migration.name, migration.checksum)
                .await?;

            tracing::info!("Migration '{}' applied successfully", migration.name);
            applied += 1;
        }

        Ok(MigrationResult { applied, skipped })
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, PersistenceError> {
        self.ensure_migrations_table().await?;

        let mut statuses = Vec::new();
        for migration in get_migrations() {
            let applied_at = self.get_migration_applied_at(migration.name).await?;
            statuses.push(MigrationStatus {
                name: migration.name.to_string(),
                applied: applied_at.is_some(),
                applied_at,
            });
        }

        Ok(statuses)
    }

    async fn ensure_migrations_table(&self) -> Result<(), PersistenceError> {
        let sql = r#"
            CREATE TABLE IF NOT EXISTS _formwright_migrations (
                name VARCHAR(255) PRIMARY KEY,
                applied_at TEXT NOT NULL,
                checksum TEXT NOT NULL
            )
        "#;

        sqlx::query(sql)
            .execute(self.pool.inner())
            .await
            .map_err(|e| {
                PersistenceError::Migration(format!("Failed to create migrations table: {}", e))
            })?;

        Ok(())
    }

    async fn is_migration_applied(&self, name: &str) -> Result<bool, PersistenceError> {
        let sql = self.pool.sql("SELECT COUNT(*) AS count FROM _formwright_migrations WHERE name = ?");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_one(self.pool.inner())
            .await
            .map_err(|e| {
                PersistenceError::Migration(format!("Failed to check migration status: {}", e))
            })?;

        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    async fn get_migration_applied_at(
        &self,
        name: &str,
    ) -> Result<Option<String>, PersistenceError> {
        let sql = self.pool.sql("SELECT applied_at FROM _formwright_migrations WHERE name = ?");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(self.pool.inner())
            .await
            .map_err(|e| {
                PersistenceError::Migration(format!("Failed to get migration applied_at: {}", e))
            })?;

        match row {
            Some(row) => Ok(Some(row.try_get("applied_at")?)),
            None => Ok(None),
        }
    }

    async fn record_migration(&self, name: &str, checksum: &str) -> Result<(), PersistenceError> {
        let now = chrono::Utc::now().to_rfc3339();
        let sql = self.pool.sql(
            "INSERT INTO _formwright_migrations (name, applied_at, checksum) VALUES (?, ?, ?)",
        );

        sqlx::query(&sql)
            .bind(name)
            .bind(&now)
            .bind(checksum)
            .execute(self.pool.inner())
            .await
            .map_err(|e| {
                PersistenceError::Migration(format!("Failed to record migration: {}", e))
            })?;

        Ok(())
    }
}

fn strip_comments(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    pub applied: usize,
    /// Already applied, left untouched
    pub skipped: usize,
}

/// Status of a single migration
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub name: String,
    pub applied: bool,
    pub applied_at: Option<String>,
}
