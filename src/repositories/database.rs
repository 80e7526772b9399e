use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::models::RepositoryResult;
use crate::observability::{DatabaseTracingMiddleware, Metrics};

/// Shared pool handle. Every repository routes its queries through
/// [`Database::trace`] so each statement gets a client span and metrics.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    tracer: DatabaseTracingMiddleware,
}

impl Database {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            pool,
            tracer: DatabaseTracingMiddleware::new(metrics),
        }
    }

    /// Open a pool sized from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.database_url)
            .await
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run one repository operation inside a `db.query` span.
    pub async fn trace<F, T>(&self, operation: &str, table: &str, future: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        let result = self.tracer.trace_operation(operation, table, future).await;
        self.tracer
            .metrics()
            .set_active_connections(f64::from(self.pool.size()) - self.pool.num_idle() as f64);
        result
    }

    /// Cheap connectivity probe used by the health endpoint
    pub async fn ping(&self) -> RepositoryResult<()> {
        self.trace("ping", "none", async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}
