use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use super::Database;
use crate::models::{RepositoryResult, WishList, WishListItem};

#[async_trait]
pub trait WishListRepository: Send + Sync {
    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<WishList>>;

    async fn create(&self, user_id: i64) -> RepositoryResult<WishList>;

    async fn find_items(&self, wish_list_id: i64) -> RepositoryResult<Vec<WishListItem>>;

    async fn contains(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool>;

    async fn add_item(
        &self,
        wish_list_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<()>;

    /// False when the product was not in the wishlist
    async fn remove_item(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct WishListRow {
    id: i64,
    user_id: i64,
    created_on: DateTime<Utc>,
    latest_updated_on: DateTime<Utc>,
}

impl From<WishListRow> for WishList {
    fn from(row: WishListRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_on: row.created_on,
            latest_updated_on: row.latest_updated_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishListItemRow {
    id: i64,
    wish_list_id: i64,
    product_id: i64,
    product_name: String,
    price: Decimal,
    old_price: Option<Decimal>,
    product_image: Option<String>,
    quantity: i32,
    created_on: DateTime<Utc>,
}

impl From<WishListItemRow> for WishListItem {
    fn from(row: WishListItemRow) -> Self {
        Self {
            id: row.id,
            wish_list_id: row.wish_list_id,
            product_id: row.product_id,
            product_name: row.product_name,
            price: row.price,
            old_price: row.old_price,
            product_image: row.product_image,
            quantity: row.quantity,
            created_on: row.created_on,
        }
    }
}

pub struct PgWishListRepository {
    db: Database,
}

impl PgWishListRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WishListRepository for PgWishListRepository {
    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<WishList>> {
        self.db
            .trace("select", "wish_lists", async {
                let row = sqlx::query_as::<_, WishListRow>(
                    "SELECT id, user_id, created_on, latest_updated_on FROM wish_lists \
                     WHERE user_id = $1",
                )
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(WishList::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn create(&self, user_id: i64) -> RepositoryResult<WishList> {
        self.db
            .trace("insert", "wish_lists", async {
                // A concurrent create for the same user returns the existing row
                let row = sqlx::query_as::<_, WishListRow>(
                    r#"
                    INSERT INTO wish_lists (user_id, created_on, latest_updated_on)
                    VALUES ($1, NOW(), NOW())
                    ON CONFLICT (user_id) DO UPDATE SET latest_updated_on = wish_lists.latest_updated_on
                    RETURNING id, user_id, created_on, latest_updated_on
                    "#,
                )
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;
                Ok(WishList::from(row))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_items(&self, wish_list_id: i64) -> RepositoryResult<Vec<WishListItem>> {
        self.db
            .trace("select", "wish_list_items", async {
                let rows = sqlx::query_as::<_, WishListItemRow>(
                    r#"
                    SELECT w.id, w.wish_list_id, w.product_id, p.name AS product_name,
                           p.price, p.old_price, p.thumbnail_image_url AS product_image,
                           w.quantity, w.created_on
                    FROM wish_list_items w
                    JOIN products p ON p.id = w.product_id
                    WHERE w.wish_list_id = $1
                    ORDER BY w.created_on, w.id
                    "#,
                )
                .bind(wish_list_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(WishListItem::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn contains(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool> {
        self.db
            .trace("select", "wish_list_items", async {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM wish_list_items \
                     WHERE wish_list_id = $1 AND product_id = $2)",
                )
                .bind(wish_list_id)
                .bind(product_id)
                .fetch_one(self.db.pool())
                .await?;
                Ok(exists)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        wish_list_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<()> {
        self.db
            .trace("insert", "wish_list_items", async {
                let mut tx = self.db.pool().begin().await?;
                sqlx::query(
                    "INSERT INTO wish_list_items (wish_list_id, product_id, quantity, created_on) \
                     VALUES ($1, $2, $3, NOW())",
                )
                .bind(wish_list_id)
                .bind(product_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
                sqlx::query("UPDATE wish_lists SET latest_updated_on = NOW() WHERE id = $1")
                    .bind(wish_list_id)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool> {
        self.db
            .trace("delete", "wish_list_items", async {
                let result = sqlx::query(
                    "DELETE FROM wish_list_items WHERE wish_list_id = $1 AND product_id = $2",
                )
                .bind(wish_list_id)
                .bind(product_id)
                .execute(self.db.pool())
                .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }
}
