use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tally_core::AppError;

use crate::config::DatabaseConfig;
use crate::list_repository::ListRepository;
use crate::prize_repository::PrizeRepository;
use crate::task_repository::TaskRepository;
use crate::user_repository::UserRepository;

/// Central database facade — owns the connection pool, runs migrations,
/// and vends repository instances.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get a [`UserRepository`] backed by this pool.
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a [`TaskRepository`] backed by this pool.
    pub fn task_repo(&self) -> TaskRepository {
        TaskRepository::new(self.pool.clone())
    }

    /// Get a [`ListRepository`] backed by this pool.
    pub fn list_repo(&self) -> ListRepository {
        ListRepository::new(self.pool.clone())
    }

    /// Get a [`PrizeRepository`] backed by this pool.
    pub fn prize_repo(&self) -> PrizeRepository {
        PrizeRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a sqlx error to the application taxonomy. Unique violations become
/// conflicts so the API layer can answer 409 instead of 500.
pub(crate) fn db_err(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::Conflict(db.message().to_string());
    }
    AppError::Database(e.to_string())
}
