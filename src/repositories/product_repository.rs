use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

use super::Database;
use crate::models::{
    PriceRange, Product, ProductAttribute, ProductListItem, ProductQuery, ProductSummary,
    RepositoryResult,
};

/// Read access to the product catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Any product by id, deleted or unpublished included
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>>;

    /// One page of the listing plus the total number of matches
    async fn find_listing(&self, query: &ProductQuery)
        -> RepositoryResult<(Vec<ProductListItem>, i64)>;

    /// Distinct attribute pairs of published products in the given categories
    async fn find_attribute_values(
        &self,
        category_ids: &[i64],
    ) -> RepositoryResult<Vec<ProductAttribute>>;

    async fn find_price_range(&self, category_ids: &[i64]) -> RepositoryResult<PriceRange>;

    async fn find_by_tag(&self, tag_id: i64) -> RepositoryResult<Vec<ProductSummary>>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) slug: String,
    pub(super) description: Option<String>,
    pub(super) short_description: Option<String>,
    pub(super) price: Decimal,
    pub(super) old_price: Option<Decimal>,
    pub(super) stock_quantity: i32,
    pub(super) display_order: i32,
    pub(super) is_published: bool,
    pub(super) is_visible_individually: bool,
    pub(super) is_deleted: bool,
    pub(super) thumbnail_image_url: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            short_description: row.short_description,
            price: row.price,
            old_price: row.old_price,
            stock_quantity: row.stock_quantity,
            display_order: row.display_order,
            is_published: row.is_published,
            is_visible_individually: row.is_visible_individually,
            is_deleted: row.is_deleted,
            thumbnail_image_url: row.thumbnail_image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: i64,
    name: String,
    description: Option<String>,
    slug: String,
    price: Decimal,
    old_price: Option<Decimal>,
    stock_quantity: i32,
    thumbnail_image_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeRow {
    product_id: i64,
    attribute_name: String,
    value: String,
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    slug: String,
    price: Decimal,
    old_price: Option<Decimal>,
    thumbnail_image_url: Option<String>,
}

/// Append the WHERE clause shared by the listing count and page queries
pub(super) fn push_listing_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(
        " WHERE p.is_published = TRUE AND p.is_deleted = FALSE \
         AND p.is_visible_individually = TRUE \
         AND EXISTS (SELECT 1 FROM product_categories pc \
         WHERE pc.product_id = p.id AND pc.category_id = ANY(",
    );
    builder.push_bind(query.category_ids.clone());
    builder.push("))");

    if let Some(min) = query.min_price {
        builder.push(" AND p.price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND p.price <= ");
        builder.push_bind(max);
    }

    for filter in &query.attribute_filters {
        builder.push(
            " AND EXISTS (SELECT 1 FROM product_attribute_values a \
             WHERE a.product_id = p.id AND a.attribute_name = ",
        );
        builder.push_bind(filter.name.clone());
        builder.push(" AND a.value = ANY(");
        builder.push_bind(filter.values.clone());
        builder.push("))");
    }
}

pub struct PgProductRepository {
    db: Database,
}

impl PgProductRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn load_details(
        &self,
        product_ids: &[i64],
    ) -> RepositoryResult<(HashMap<i64, Vec<ProductAttribute>>, HashMap<i64, Vec<String>>)> {
        let attribute_rows = sqlx::query_as::<_, AttributeRow>(
            "SELECT product_id, attribute_name, value FROM product_attribute_values \
             WHERE product_id = ANY($1) ORDER BY attribute_name, value",
        )
        .bind(product_ids)
        .fetch_all(self.db.pool())
        .await?;

        let media_rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT product_id, media_url FROM product_media \
             WHERE product_id = ANY($1) ORDER BY display_order, id",
        )
        .bind(product_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut attributes: HashMap<i64, Vec<ProductAttribute>> = HashMap::new();
        for row in attribute_rows {
            attributes
                .entry(row.product_id)
                .or_default()
                .push(ProductAttribute {
                    name: row.attribute_name,
                    value: row.value,
                });
        }

        let mut media: HashMap<i64, Vec<String>> = HashMap::new();
        for (product_id, url) in media_rows {
            media.entry(product_id).or_default().push(url);
        }

        Ok((attributes, media))
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        self.db
            .trace("select", "products", async {
                let row = sqlx::query_as::<_, ProductRow>(
                    "SELECT id, name, slug, description, short_description, price, old_price, \
                     stock_quantity, display_order, is_published, is_visible_individually, \
                     is_deleted, thumbnail_image_url FROM products WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(Product::from))
            })
            .await
    }

    #[instrument(skip(self, query), fields(page = query.page, page_size = query.page_size))]
    async fn find_listing(
        &self,
        query: &ProductQuery,
    ) -> RepositoryResult<(Vec<ProductListItem>, i64)> {
        self.db
            .trace("select_listing", "products", async {
                let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
                push_listing_filters(&mut count, query);
                let total: i64 = count
                    .build_query_scalar()
                    .fetch_one(self.db.pool())
                    .await?;

                let mut page = QueryBuilder::<Postgres>::new(
                    "SELECT p.id, p.name, p.description, p.slug, p.price, p.old_price, \
                     p.stock_quantity, p.thumbnail_image_url FROM products p",
                );
                push_listing_filters(&mut page, query);
                page.push(" ORDER BY p.display_order, p.id LIMIT ");
                page.push_bind(i64::from(query.page_size));
                page.push(" OFFSET ");
                page.push_bind(query.offset());

                let rows: Vec<ListingRow> = page
                    .build_query_as()
                    .fetch_all(self.db.pool())
                    .await?;

                let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
                let (mut attributes, mut media) = self.load_details(&ids).await?;

                let items = rows
                    .into_iter()
                    .map(|row| ProductListItem {
                        media_urls: media.remove(&row.id).unwrap_or_default(),
                        attributes: attributes.remove(&row.id).unwrap_or_default(),
                        id: row.id,
                        name: row.name,
                        description: row.description,
                        slug: row.slug,
                        price: row.price,
                        old_price: row.old_price,
                        stock_quantity: row.stock_quantity,
                        thumbnail_image_url: row.thumbnail_image_url,
                    })
                    .collect();

                Ok((items, total))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_attribute_values(
        &self,
        category_ids: &[i64],
    ) -> RepositoryResult<Vec<ProductAttribute>> {
        self.db
            .trace("select_attributes", "product_attribute_values", async {
                let rows = sqlx::query_as::<_, (String, String)>(
                    r#"
                    SELECT DISTINCT a.attribute_name, a.value
                    FROM product_attribute_values a
                    JOIN products p ON p.id = a.product_id
                    WHERE p.is_published = TRUE AND p.is_deleted = FALSE
                      AND EXISTS (SELECT 1 FROM product_categories pc
                                  WHERE pc.product_id = p.id AND pc.category_id = ANY($1))
                    "#,
                )
                .bind(category_ids)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|(name, value)| ProductAttribute { name, value })
                    .collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_price_range(&self, category_ids: &[i64]) -> RepositoryResult<PriceRange> {
        self.db
            .trace("select_price_range", "products", async {
                let (min, max) = sqlx::query_as::<_, (Option<Decimal>, Option<Decimal>)>(
                    r#"
                    SELECT MIN(p.price), MAX(p.price)
                    FROM products p
                    WHERE p.is_published = TRUE AND p.is_deleted = FALSE
                      AND EXISTS (SELECT 1 FROM product_categories pc
                                  WHERE pc.product_id = p.id AND pc.category_id = ANY($1))
                    "#,
                )
                .bind(category_ids)
                .fetch_one(self.db.pool())
                .await?;
                Ok(PriceRange {
                    min: min.unwrap_or(Decimal::ZERO),
                    max: max.unwrap_or(Decimal::ZERO),
                })
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_tag(&self, tag_id: i64) -> RepositoryResult<Vec<ProductSummary>> {
        self.db
            .trace("select_by_tag", "product_tag_mappings", async {
                let rows = sqlx::query_as::<_, SummaryRow>(
                    r#"
                    SELECT p.id, p.name, p.slug, p.price, p.old_price, p.thumbnail_image_url
                    FROM products p
                    JOIN product_tag_mappings m ON m.product_id = p.id
                    WHERE m.product_tag_id = $1 AND p.is_deleted = FALSE
                    ORDER BY p.display_order, p.id
                    "#,
                )
                .bind(tag_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|row| ProductSummary {
                        id: row.id,
                        name: row.name,
                        slug: row.slug,
                        price: row.price,
                        old_price: row.old_price,
                        thumbnail_image_url: row.thumbnail_image_url,
                    })
                    .collect())
            })
            .await
    }
}
