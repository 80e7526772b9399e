use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use super::Database;
use crate::models::{Banner, Category, ProductCategory, RepositoryError, RepositoryResult};

/// Data access for categories, their banners and product links
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Non-deleted categories ordered by display order
    async fn find_all(&self) -> RepositoryResult<Vec<Category>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>>;

    /// Non-deleted direct children ordered by display order
    async fn find_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>>;

    /// `(id, parent_id)` of every non-deleted category
    async fn find_parent_links(&self) -> RepositoryResult<Vec<(i64, Option<i64>)>>;

    async fn create(&self, category: Category) -> RepositoryResult<Category>;

    async fn update(&self, category: Category) -> RepositoryResult<Category>;

    async fn soft_delete(&self, id: i64) -> RepositoryResult<()>;

    /// Banners attached to a category, unfiltered
    async fn find_banners(&self, category_id: i64) -> RepositoryResult<Vec<Banner>>;

    async fn find_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>>;

    async fn update_product_category(&self, link: ProductCategory) -> RepositoryResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CategoryRow {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) slug: String,
    pub(super) description: Option<String>,
    pub(super) meta_title: Option<String>,
    pub(super) meta_keywords: Option<String>,
    pub(super) meta_description: Option<String>,
    pub(super) display_order: i32,
    pub(super) parent_id: Option<i64>,
    pub(super) include_in_menu: bool,
    pub(super) is_published: bool,
    pub(super) is_deleted: bool,
    pub(super) thumbnail_image_url: Option<String>,
    pub(super) created_on: DateTime<Utc>,
    pub(super) latest_updated_on: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            meta_title: row.meta_title,
            meta_keywords: row.meta_keywords,
            meta_description: row.meta_description,
            display_order: row.display_order,
            parent_id: row.parent_id,
            include_in_menu: row.include_in_menu,
            is_published: row.is_published,
            is_deleted: row.is_deleted,
            thumbnail_image_url: row.thumbnail_image_url,
            created_on: row.created_on,
            latest_updated_on: row.latest_updated_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductCategoryRow {
    id: i64,
    product_id: i64,
    category_id: i64,
    is_featured_product: bool,
    display_order: i32,
}

impl From<ProductCategoryRow> for ProductCategory {
    fn from(row: ProductCategoryRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            category_id: row.category_id,
            is_featured_product: row.is_featured_product,
            display_order: row.display_order,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, meta_title, meta_keywords, \
     meta_description, display_order, parent_id, include_in_menu, is_published, is_deleted, \
     thumbnail_image_url, created_on, latest_updated_on";

pub struct PgCategoryRepository {
    db: Database,
}

impl PgCategoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Category>> {
        self.db
            .trace("select", "categories", async {
                let rows = sqlx::query_as::<_, CategoryRow>(&format!(
                    "SELECT {} FROM categories WHERE is_deleted = FALSE ORDER BY display_order, id",
                    CATEGORY_COLUMNS
                ))
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(Category::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        self.db
            .trace("select", "categories", async {
                let row = sqlx::query_as::<_, CategoryRow>(&format!(
                    "SELECT {} FROM categories WHERE id = $1 AND is_deleted = FALSE",
                    CATEGORY_COLUMNS
                ))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(Category::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>> {
        self.db
            .trace("select_by_slug", "categories", async {
                let row = sqlx::query_as::<_, CategoryRow>(&format!(
                    "SELECT {} FROM categories WHERE slug = $1 AND is_deleted = FALSE \
                     ORDER BY id LIMIT 1",
                    CATEGORY_COLUMNS
                ))
                .bind(slug)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(Category::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>> {
        self.db
            .trace("select_children", "categories", async {
                let rows = sqlx::query_as::<_, CategoryRow>(&format!(
                    "SELECT {} FROM categories WHERE parent_id = $1 AND is_deleted = FALSE \
                     ORDER BY display_order, id",
                    CATEGORY_COLUMNS
                ))
                .bind(parent_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(Category::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_parent_links(&self) -> RepositoryResult<Vec<(i64, Option<i64>)>> {
        self.db
            .trace("select_links", "categories", async {
                let links = sqlx::query_as::<_, (i64, Option<i64>)>(
                    "SELECT id, parent_id FROM categories WHERE is_deleted = FALSE",
                )
                .fetch_all(self.db.pool())
                .await?;
                Ok(links)
            })
            .await
    }

    #[instrument(skip(self, category), fields(slug = %category.slug))]
    async fn create(&self, category: Category) -> RepositoryResult<Category> {
        self.db
            .trace("insert", "categories", async {
                let row = sqlx::query_as::<_, CategoryRow>(&format!(
                    r#"
                    INSERT INTO categories (
                        name, slug, description, meta_title, meta_keywords, meta_description,
                        display_order, parent_id, include_in_menu, is_published, is_deleted,
                        thumbnail_image_url, created_on, latest_updated_on
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11, $12, $12)
                    RETURNING {}
                    "#,
                    CATEGORY_COLUMNS
                ))
                .bind(&category.name)
                .bind(&category.slug)
                .bind(&category.description)
                .bind(&category.meta_title)
                .bind(&category.meta_keywords)
                .bind(&category.meta_description)
                .bind(category.display_order)
                .bind(category.parent_id)
                .bind(category.include_in_menu)
                .bind(category.is_published)
                .bind(&category.thumbnail_image_url)
                .bind(category.created_on)
                .fetch_one(self.db.pool())
                .await?;
                Ok(Category::from(row))
            })
            .await
    }

    #[instrument(skip(self, category), fields(id = category.id))]
    async fn update(&self, category: Category) -> RepositoryResult<Category> {
        self.db
            .trace("update", "categories", async {
                let row = sqlx::query_as::<_, CategoryRow>(&format!(
                    r#"
                    UPDATE categories SET
                        name = $2, slug = $3, description = $4, meta_title = $5,
                        meta_keywords = $6, meta_description = $7, display_order = $8,
                        parent_id = $9, include_in_menu = $10, is_published = $11,
                        thumbnail_image_url = $12, latest_updated_on = $13
                    WHERE id = $1 AND is_deleted = FALSE
                    RETURNING {}
                    "#,
                    CATEGORY_COLUMNS
                ))
                .bind(category.id)
                .bind(&category.name)
                .bind(&category.slug)
                .bind(&category.description)
                .bind(&category.meta_title)
                .bind(&category.meta_keywords)
                .bind(&category.meta_description)
                .bind(category.display_order)
                .bind(category.parent_id)
                .bind(category.include_in_menu)
                .bind(category.is_published)
                .bind(&category.thumbnail_image_url)
                .bind(category.latest_updated_on)
                .fetch_optional(self.db.pool())
                .await?;
                row.map(Category::from).ok_or(RepositoryError::NotFound)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: i64) -> RepositoryResult<()> {
        self.db
            .trace("soft_delete", "categories", async {
                let result = sqlx::query(
                    "UPDATE categories SET is_deleted = TRUE, latest_updated_on = NOW() \
                     WHERE id = $1 AND is_deleted = FALSE",
                )
                .bind(id)
                .execute(self.db.pool())
                .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_banners(&self, category_id: i64) -> RepositoryResult<Vec<Banner>> {
        self.db
            .trace("select", "category_banners", async {
                let rows = sqlx::query_as::<_, super::banner_repository::BannerRow>(
                    r#"
                    SELECT b.id, b.title_en, b.subtitle_en, b.description_en, b.title_ar,
                           b.subtitle_ar, b.description_ar, b.link_url, b.thumbnail_url,
                           b.page_type_id, b.banner_type_id, b.position, b.is_active,
                           b.start_date, b.end_date, b.created_on, b.updated_on
                    FROM banners b
                    JOIN category_banners cb ON cb.banner_id = b.id
                    WHERE cb.category_id = $1
                    "#,
                )
                .bind(category_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(Banner::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>> {
        self.db
            .trace("select", "product_categories", async {
                let row = sqlx::query_as::<_, ProductCategoryRow>(
                    "SELECT id, product_id, category_id, is_featured_product, display_order \
                     FROM product_categories WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(ProductCategory::from))
            })
            .await
    }

    #[instrument(skip(self, link), fields(id = link.id))]
    async fn update_product_category(&self, link: ProductCategory) -> RepositoryResult<()> {
        self.db
            .trace("update", "product_categories", async {
                let result = sqlx::query(
                    "UPDATE product_categories SET is_featured_product = $2, display_order = $3 \
                     WHERE id = $1",
                )
                .bind(link.id)
                .bind(link.is_featured_product)
                .bind(link.display_order)
                .execute(self.db.pool())
                .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            })
            .await
    }
}
