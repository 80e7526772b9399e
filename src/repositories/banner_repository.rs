use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use super::Database;
use crate::models::{Banner, BannerCode, RepositoryResult};

#[async_trait]
pub trait BannerRepository: Send + Sync {
    async fn find_page_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>>;

    async fn find_banner_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>>;

    /// Every banner of a page type and banner type, live or not
    async fn find_by_types(
        &self,
        page_type_id: i64,
        banner_type_id: i64,
    ) -> RepositoryResult<Vec<Banner>>;

    async fn create(&self, banner: Banner) -> RepositoryResult<Banner>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct BannerRow {
    id: i64,
    title_en: Option<String>,
    subtitle_en: Option<String>,
    description_en: Option<String>,
    title_ar: Option<String>,
    subtitle_ar: Option<String>,
    description_ar: Option<String>,
    link_url: Option<String>,
    thumbnail_url: Option<String>,
    page_type_id: i64,
    banner_type_id: i64,
    position: i32,
    is_active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
}

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: row.id,
            title_en: row.title_en,
            subtitle_en: row.subtitle_en,
            description_en: row.description_en,
            title_ar: row.title_ar,
            subtitle_ar: row.subtitle_ar,
            description_ar: row.description_ar,
            link_url: row.link_url,
            thumbnail_url: row.thumbnail_url,
            page_type_id: row.page_type_id,
            banner_type_id: row.banner_type_id,
            position: row.position,
            is_active: row.is_active,
            start_date: row.start_date,
            end_date: row.end_date,
            created_on: row.created_on,
            updated_on: row.updated_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BannerCodeRow {
    id: i64,
    code: String,
    name: String,
}

impl From<BannerCodeRow> for BannerCode {
    fn from(row: BannerCodeRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
        }
    }
}

const BANNER_COLUMNS: &str = "id, title_en, subtitle_en, description_en, title_ar, subtitle_ar, \
     description_ar, link_url, thumbnail_url, page_type_id, banner_type_id, position, is_active, \
     start_date, end_date, created_on, updated_on";

pub struct PgBannerRepository {
    db: Database,
}

impl PgBannerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn find_code(&self, table: &'static str, code: &str) -> RepositoryResult<Option<BannerCode>> {
        self.db
            .trace("select_by_code", table, async {
                let row = sqlx::query_as::<_, BannerCodeRow>(&format!(
                    "SELECT id, code, name FROM {} WHERE code = $1",
                    table
                ))
                .bind(code)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(BannerCode::from))
            })
            .await
    }
}

#[async_trait]
impl BannerRepository for PgBannerRepository {
    #[instrument(skip(self))]
    async fn find_page_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>> {
        self.find_code("banner_page_types", code).await
    }

    #[instrument(skip(self))]
    async fn find_banner_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>> {
        self.find_code("banner_types", code).await
    }

    #[instrument(skip(self))]
    async fn find_by_types(
        &self,
        page_type_id: i64,
        banner_type_id: i64,
    ) -> RepositoryResult<Vec<Banner>> {
        self.db
            .trace("select", "banners", async {
                let rows = sqlx::query_as::<_, BannerRow>(&format!(
                    "SELECT {} FROM banners WHERE page_type_id = $1 AND banner_type_id = $2",
                    BANNER_COLUMNS
                ))
                .bind(page_type_id)
                .bind(banner_type_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows.into_iter().map(Banner::from).collect())
            })
            .await
    }

    #[instrument(skip(self, banner))]
    async fn create(&self, banner: Banner) -> RepositoryResult<Banner> {
        self.db
            .trace("insert", "banners", async {
                let row = sqlx::query_as::<_, BannerRow>(&format!(
                    r#"
                    INSERT INTO banners (
                        title_en, subtitle_en, description_en, title_ar, subtitle_ar,
                        description_ar, link_url, thumbnail_url, page_type_id, banner_type_id,
                        position, is_active, start_date, end_date, created_on, updated_on
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
                    RETURNING {}
                    "#,
                    BANNER_COLUMNS
                ))
                .bind(&banner.title_en)
                .bind(&banner.subtitle_en)
                .bind(&banner.description_en)
                .bind(&banner.title_ar)
                .bind(&banner.subtitle_ar)
                .bind(&banner.description_ar)
                .bind(&banner.link_url)
                .bind(&banner.thumbnail_url)
                .bind(banner.page_type_id)
                .bind(banner.banner_type_id)
                .bind(banner.position)
                .bind(banner.is_active)
                .bind(banner.start_date)
                .bind(banner.end_date)
                .bind(banner.created_on)
                .fetch_one(self.db.pool())
                .await?;
                Ok(Banner::from(row))
            })
            .await
    }
}
