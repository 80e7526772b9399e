use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use tracing::instrument;

use super::Database;
use crate::models::{Menu, MenuItem, MenuItemChanges, NewMenuItem, RepositoryError, RepositoryResult};

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Active menus ordered by id
    async fn find_active(&self) -> RepositoryResult<Vec<Menu>>;

    /// First active menu of a type
    async fn find_active_by_type(&self, menu_type_id: i64) -> RepositoryResult<Option<Menu>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Menu>>;

    async fn find_items(&self, menu_ids: &[i64]) -> RepositoryResult<Vec<MenuItem>>;

    /// Insert a menu and its items atomically
    async fn create(&self, menu: Menu, items: Vec<NewMenuItem>) -> RepositoryResult<Menu>;

    /// Save menu fields and apply item changes atomically
    async fn update(&self, menu: Menu, changes: MenuItemChanges) -> RepositoryResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
struct MenuRow {
    id: i64,
    menu_type_id: i64,
    code: String,
    name: String,
    is_active: bool,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
}

impl From<MenuRow> for Menu {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            menu_type_id: row.menu_type_id,
            code: row.code,
            name: row.name,
            is_active: row.is_active,
            created_on: row.created_on,
            modified_on: row.modified_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    menu_id: i64,
    parent_id: Option<i64>,
    menu_item_type_id: i64,
    entity_id: Option<i64>,
    title_en: String,
    title_ar: Option<String>,
    url: Option<String>,
    position: i32,
    is_active: bool,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            menu_id: row.menu_id,
            parent_id: row.parent_id,
            menu_item_type_id: row.menu_item_type_id,
            entity_id: row.entity_id,
            title_en: row.title_en,
            title_ar: row.title_ar,
            url: row.url,
            position: row.position,
            is_active: row.is_active,
        }
    }
}

const MENU_COLUMNS: &str = "id, menu_type_id, code, name, is_active, created_on, modified_on";

pub struct PgMenuRepository {
    db: Database,
}

impl PgMenuRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

async fn insert_items(
    tx: &mut Transaction<'_, Postgres>,
    menu_id: i64,
    items: &[NewMenuItem],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO menu_items (
                menu_id, parent_id, menu_item_type_id, entity_id,
                title_en, title_ar, url, position, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(menu_id)
        .bind(item.parent_id)
        .bind(item.menu_item_type_id)
        .bind(item.entity_id)
        .bind(&item.title_en)
        .bind(&item.title_ar)
        .bind(&item.url)
        .bind(item.position)
        .bind(item.is_active)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    #[instrument(skip(self))]
    async fn find_active(&self) -> RepositoryResult<Vec<Menu>> {
        self.db
            .trace("select_active", "menus", async {
                let rows = sqlx::query_as::<_, MenuRow>(&format!(
                    "SELECT {} FROM menus WHERE is_active = TRUE ORDER BY id",
                    MENU_COLUMNS
                ))
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(Menu::from).collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_active_by_type(&self, menu_type_id: i64) -> RepositoryResult<Option<Menu>> {
        self.db
            .trace("select_by_type", "menus", async {
                let row = sqlx::query_as::<_, MenuRow>(&format!(
                    "SELECT {} FROM menus WHERE is_active = TRUE AND menu_type_id = $1 \
                     ORDER BY id LIMIT 1",
                    MENU_COLUMNS
                ))
                .bind(menu_type_id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(Menu::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Menu>> {
        self.db
            .trace("select", "menus", async {
                let row = sqlx::query_as::<_, MenuRow>(&format!(
                    "SELECT {} FROM menus WHERE id = $1",
                    MENU_COLUMNS
                ))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(Menu::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_items(&self, menu_ids: &[i64]) -> RepositoryResult<Vec<MenuItem>> {
        self.db
            .trace("select", "menu_items", async {
                let rows = sqlx::query_as::<_, MenuItemRow>(
                    "SELECT id, menu_id, parent_id, menu_item_type_id, entity_id, title_en, \
                     title_ar, url, position, is_active FROM menu_items \
                     WHERE menu_id = ANY($1) ORDER BY position, id",
                )
                .bind(menu_ids)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(MenuItem::from).collect())
            })
            .await
    }

    #[instrument(skip(self, menu, items), fields(code = %menu.code, items = items.len()))]
    async fn create(&self, menu: Menu, items: Vec<NewMenuItem>) -> RepositoryResult<Menu> {
        self.db
            .trace("insert", "menus", async {
                let mut tx = self.db.pool().begin().await?;

                let row = sqlx::query_as::<_, MenuRow>(&format!(
                    "INSERT INTO menus (menu_type_id, code, name, is_active, created_on, modified_on) \
                     VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
                    MENU_COLUMNS
                ))
                .bind(menu.menu_type_id)
                .bind(&menu.code)
                .bind(&menu.name)
                .bind(menu.is_active)
                .bind(menu.created_on)
                .fetch_one(&mut *tx)
                .await?;

                insert_items(&mut tx, row.id, &items).await?;
                tx.commit().await?;

                Ok(Menu::from(row))
            })
            .await
    }

    #[instrument(skip(self, menu, changes), fields(menu_id = menu.id))]
    async fn update(&self, menu: Menu, changes: MenuItemChanges) -> RepositoryResult<()> {
        self.db
            .trace("update", "menus", async {
                let mut tx = self.db.pool().begin().await?;

                let result = sqlx::query(
                    "UPDATE menus SET name = $2, is_active = $3, modified_on = NOW() WHERE id = $1",
                )
                .bind(menu.id)
                .bind(&menu.name)
                .bind(menu.is_active)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }

                if !changes.deleted.is_empty() {
                    sqlx::query("DELETE FROM menu_items WHERE menu_id = $1 AND id = ANY($2)")
                        .bind(menu.id)
                        .bind(&changes.deleted)
                        .execute(&mut *tx)
                        .await?;
                }

                for item in &changes.updated {
                    sqlx::query(
                        r#"
                        UPDATE menu_items SET
                            parent_id = $3, menu_item_type_id = $4, entity_id = $5,
                            title_en = $6, title_ar = $7, url = $8, position = $9, is_active = $10
                        WHERE id = $1 AND menu_id = $2
                        "#,
                    )
                    .bind(item.id)
                    .bind(menu.id)
                    .bind(item.parent_id)
                    .bind(item.menu_item_type_id)
                    .bind(item.entity_id)
                    .bind(&item.title_en)
                    .bind(&item.title_ar)
                    .bind(&item.url)
                    .bind(item.position)
                    .bind(item.is_active)
                    .execute(&mut *tx)
                    .await?;
                }

                insert_items(&mut tx, menu.id, &changes.inserted).await?;
                tx.commit().await?;

                Ok(())
            })
            .await
    }
}
