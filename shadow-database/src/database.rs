use std::path::Path;
use std::str::FromStr;

use anyhow::Context as _;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqlitePool, migrate::Migrator};

use crate::cache::CacheService;

/// Compile-time discovered SQLx migrations for the `shadow-database` crate.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Shared database handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
    cache: CacheService,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub records: i64,
}

#[derive(Clone, Debug)]
pub struct DatabaseInfo {
    pub tables: Vec<TableInfo>,
}

impl Database {
    /// Create a database handle from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cache: CacheService::new("shadow"),
        }
    }

    /// Open (creating if missing) the data file at `path` and apply migrations.
    pub async fn connect(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create data dir {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .context("invalid database path")?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        MIGRATOR
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Self::new(pool))
    }

    /// Single-connection in-memory database with migrations applied.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("invalid in-memory database url")?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open in-memory database")?;

        MIGRATOR
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Self::new(pool))
    }

    /// Expose the underlying pool for query modules.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Expose the rate-limit cache for query modules.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub async fn health_check(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => true,
            Err(source) => {
                tracing::error!(?source, "database health check failed");
                false
            }
        }
    }

    /// Table names with their row counts.
    pub async fn info(&self) -> anyhow::Result<DatabaseInfo> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%'
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            // Names come from sqlite_master, not from user input.
            let records: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{name}\""))
                .fetch_one(&self.pool)
                .await
                .with_context(|| format!("failed to count rows of {name}"))?;
            tables.push(TableInfo { name, records });
        }

        Ok(DatabaseInfo { tables })
    }

    /// Write a consistent copy of the whole database to `target`.
    pub async fn snapshot_to(&self, target: &Path) -> anyhow::Result<()> {
        if tokio::fs::try_exists(target).await.unwrap_or(false) {
            anyhow::bail!("snapshot target {} already exists", target.display());
        }

        sqlx::query("VACUUM INTO ?")
            .bind(target.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to snapshot database to {}", target.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Database;

    #[tokio::test]
    async fn in_memory_database_is_migrated() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.health_check().await);

        let info = db.info().await.unwrap();
        let names: Vec<&str> = info.tables.iter().map(|table| table.name.as_str()).collect();
        for expected in [
            "admins",
            "bot_settings",
            "command_logs",
            "commands",
            "groups",
            "users",
        ] {
            assert!(names.contains(&expected), "missing table {expected}");
        }

        let settings = info
            .tables
            .iter()
            .find(|table| table.name == "bot_settings")
            .unwrap();
        assert_eq!(settings.records, 0);
    }

    #[tokio::test]
    async fn connect_creates_file_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("shadow.db");

        let db = Database::connect(&path).await.unwrap();
        assert!(path.exists());

        let snapshot = dir.path().join("copy.db");
        db.snapshot_to(&snapshot).await.unwrap();
        assert!(snapshot.exists());

        let copy = Database::connect(&snapshot).await.unwrap();
        let info = copy.info().await.unwrap();
        assert!(info.tables.iter().any(|table| table.name == "users"));

        assert!(db.snapshot_to(&snapshot).await.is_err());
    }
}
