use async_trait::async_trait;
use sqlx::types::Json;
use tracing::instrument;

use super::Database;
use crate::models::{PaymentProvider, RepositoryResult};

#[async_trait]
pub trait PaymentProviderRepository: Send + Sync {
    async fn find_enabled(&self) -> RepositoryResult<Vec<PaymentProvider>>;

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<PaymentProvider>>;

    /// False when no provider has the id
    async fn set_enabled(&self, id: &str, is_enabled: bool) -> RepositoryResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentProviderRow {
    id: String,
    name: String,
    is_enabled: bool,
    landing_view_component_name: String,
    additional_settings: Option<Json<serde_json::Value>>,
}

impl From<PaymentProviderRow> for PaymentProvider {
    fn from(row: PaymentProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            is_enabled: row.is_enabled,
            landing_view_component_name: row.landing_view_component_name,
            additional_settings: row.additional_settings.map(|Json(v)| v),
        }
    }
}

const PROVIDER_COLUMNS: &str =
    "id, name, is_enabled, landing_view_component_name, additional_settings";

pub struct PgPaymentProviderRepository {
    db: Database,
}

impl PgPaymentProviderRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PaymentProviderRepository for PgPaymentProviderRepository {
    #[instrument(skip(self))]
    async fn find_enabled(&self) -> RepositoryResult<Vec<PaymentProvider>> {
        self.db
            .trace("select_enabled", "payment_providers", async {
                let rows = sqlx::query_as::<_, PaymentProviderRow>(&format!(
                    "SELECT {} FROM payment_providers WHERE is_enabled = TRUE ORDER BY id",
                    PROVIDER_COLUMNS
                ))
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(PaymentProvider::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<PaymentProvider>> {
        self.db
            .trace("select", "payment_providers", async {
                let row = sqlx::query_as::<_, PaymentProviderRow>(&format!(
                    "SELECT {} FROM payment_providers WHERE id = $1",
                    PROVIDER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(PaymentProvider::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn set_enabled(&self, id: &str, is_enabled: bool) -> RepositoryResult<bool> {
        self.db
            .trace("update", "payment_providers", async {
                let result =
                    sqlx::query("UPDATE payment_providers SET is_enabled = $2 WHERE id = $1")
                        .bind(id)
                        .bind(is_enabled)
                        .execute(self.db.pool())
                        .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }
}
