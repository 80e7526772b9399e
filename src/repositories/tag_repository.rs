use async_trait::async_trait;
use tracing::instrument;

use super::Database;
use crate::models::{ProductTag, RepositoryResult, TagMapping};

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductTag>>;

    async fn create(&self, tag: ProductTag) -> RepositoryResult<ProductTag>;

    /// Remove a tag and its mappings; false when nothing was deleted
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;

    async fn mapping_exists(&self, mapping: TagMapping) -> RepositoryResult<bool>;

    async fn add_mapping(&self, mapping: TagMapping) -> RepositoryResult<()>;

    /// False when the mapping did not exist
    async fn remove_mapping(&self, mapping: TagMapping) -> RepositoryResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct ProductTagRow {
    id: i64,
    title_en: String,
    title_ar: Option<String>,
    product_tag_type_id: i64,
    is_active: bool,
}

impl From<ProductTagRow> for ProductTag {
    fn from(row: ProductTagRow) -> Self {
        Self {
            id: row.id,
            title_en: row.title_en,
            title_ar: row.title_ar,
            product_tag_type_id: row.product_tag_type_id,
            is_active: row.is_active,
        }
    }
}

pub struct PgTagRepository {
    db: Database,
}

impl PgTagRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductTag>> {
        self.db
            .trace("select", "product_tags", async {
                let row = sqlx::query_as::<_, ProductTagRow>(
                    "SELECT id, title_en, title_ar, product_tag_type_id, is_active \
                     FROM product_tags WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(ProductTag::from))
            })
            .await
    }

    #[instrument(skip(self, tag), fields(title = %tag.title_en))]
    async fn create(&self, tag: ProductTag) -> RepositoryResult<ProductTag> {
        self.db
            .trace("insert", "product_tags", async {
                let row = sqlx::query_as::<_, ProductTagRow>(
                    "INSERT INTO product_tags (title_en, title_ar, product_tag_type_id, is_active) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING id, title_en, title_ar, product_tag_type_id, is_active",
                )
                .bind(&tag.title_en)
                .bind(&tag.title_ar)
                .bind(tag.product_tag_type_id)
                .bind(tag.is_active)
                .fetch_one(self.db.pool())
                .await?;
                Ok(ProductTag::from(row))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        self.db
            .trace("delete", "product_tags", async {
                let result = sqlx::query("DELETE FROM product_tags WHERE id = $1")
                    .bind(id)
                    .execute(self.db.pool())
                    .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn mapping_exists(&self, mapping: TagMapping) -> RepositoryResult<bool> {
        self.db
            .trace("select", "product_tag_mappings", async {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM product_tag_mappings \
                     WHERE product_id = $1 AND product_tag_id = $2)",
                )
                .bind(mapping.product_id)
                .bind(mapping.product_tag_id)
                .fetch_one(self.db.pool())
                .await?;
                Ok(exists)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn add_mapping(&self, mapping: TagMapping) -> RepositoryResult<()> {
        self.db
            .trace("insert", "product_tag_mappings", async {
                sqlx::query(
                    "INSERT INTO product_tag_mappings (product_id, product_tag_id, created_on) \
                     VALUES ($1, $2, NOW())",
                )
                .bind(mapping.product_id)
                .bind(mapping.product_tag_id)
                .execute(self.db.pool())
                .await?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove_mapping(&self, mapping: TagMapping) -> RepositoryResult<bool> {
        self.db
            .trace("delete", "product_tag_mappings", async {
                let result = sqlx::query(
                    "DELETE FROM product_tag_mappings WHERE product_id = $1 AND product_tag_id = $2",
                )
                .bind(mapping.product_id)
                .bind(mapping.product_tag_id)
                .execute(self.db.pool())
                .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }
}
