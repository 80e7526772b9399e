use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use super::Database;
use crate::models::{NewUser, RepositoryError, RepositoryResult, Role, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Duplicate emails surface as a constraint violation
    async fn create(&self, user: NewUser) -> RepositoryResult<User>;

    async fn update_refresh_token(&self, id: i64, token: Option<String>) -> RepositoryResult<()>;

    async fn set_password_reset(
        &self,
        id: i64,
        token: &str,
        expires: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Store a new hash and clear any pending reset token
    async fn reset_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;

    async fn update_full_name(&self, id: i64, full_name: &str) -> RepositoryResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    pub(super) id: i64,
    pub(super) user_guid: Uuid,
    pub(super) email: String,
    pub(super) full_name: String,
    pub(super) password_hash: String,
    pub(super) culture: Option<String>,
    pub(super) roles: Vec<String>,
    pub(super) default_shipping_address_id: Option<i64>,
    pub(super) default_billing_address_id: Option<i64>,
    pub(super) refresh_token: Option<String>,
    pub(super) password_reset_token: Option<String>,
    pub(super) password_reset_expires: Option<DateTime<Utc>>,
    pub(super) created_on: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles = row
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|message| RepositoryError::DataCorruption { message })?;

        Ok(Self {
            id: row.id,
            user_guid: row.user_guid,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            culture: row.culture,
            roles,
            default_shipping_address_id: row.default_shipping_address_id,
            default_billing_address_id: row.default_billing_address_id,
            refresh_token: row.refresh_token,
            password_reset_token: row.password_reset_token,
            password_reset_expires: row.password_reset_expires,
            created_on: row.created_on,
        })
    }
}

const USER_COLUMNS: &str = "id, user_guid, email, full_name, password_hash, culture, roles, \
     default_shipping_address_id, default_billing_address_id, refresh_token, \
     password_reset_token, password_reset_expires, created_on";

pub struct PgUserRepository {
    db: Database,
}

impl PgUserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn affected(rows: u64) -> RepositoryResult<()> {
    if rows == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.db
            .trace("select", "users", async {
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users WHERE id = $1",
                    USER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
                row.map(User::try_from).transpose()
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.db
            .trace("select_by_email", "users", async {
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
                    USER_COLUMNS
                ))
                .bind(email)
                .fetch_optional(self.db.pool())
                .await?;
                row.map(User::try_from).transpose()
            })
            .await
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        self.db
            .trace("insert", "users", async {
                let roles: Vec<String> = user.roles.iter().map(Role::to_string).collect();
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    r#"
                    INSERT INTO users (user_guid, email, full_name, password_hash, culture, roles, created_on)
                    VALUES ($1, $2, $3, $4, $5, $6, NOW())
                    RETURNING {}
                    "#,
                    USER_COLUMNS
                ))
                .bind(Uuid::new_v4())
                .bind(&user.email)
                .bind(&user.full_name)
                .bind(&user.password_hash)
                .bind(&user.culture)
                .bind(&roles)
                .fetch_one(self.db.pool())
                .await?;
                User::try_from(row)
            })
            .await
    }

    #[instrument(skip(self, token))]
    async fn update_refresh_token(&self, id: i64, token: Option<String>) -> RepositoryResult<()> {
        self.db
            .trace("update_refresh_token", "users", async {
                let result = sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
                    .bind(id)
                    .bind(token)
                    .execute(self.db.pool())
                    .await?;
                affected(result.rows_affected())
            })
            .await
    }

    #[instrument(skip(self, token))]
    async fn set_password_reset(
        &self,
        id: i64,
        token: &str,
        expires: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.db
            .trace("set_password_reset", "users", async {
                let result = sqlx::query(
                    "UPDATE users SET password_reset_token = $2, password_reset_expires = $3 \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(token)
                .bind(expires)
                .execute(self.db.pool())
                .await?;
                affected(result.rows_affected())
            })
            .await
    }

    #[instrument(skip(self, password_hash))]
    async fn reset_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        self.db
            .trace("reset_password", "users", async {
                let result = sqlx::query(
                    "UPDATE users SET password_hash = $2, password_reset_token = NULL, \
                     password_reset_expires = NULL WHERE id = $1",
                )
                .bind(id)
                .bind(password_hash)
                .execute(self.db.pool())
                .await?;
                affected(result.rows_affected())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn update_full_name(&self, id: i64, full_name: &str) -> RepositoryResult<()> {
        self.db
            .trace("update_full_name", "users", async {
                let result = sqlx::query("UPDATE users SET full_name = $2 WHERE id = $1")
                    .bind(id)
                    .bind(full_name)
                    .execute(self.db.pool())
                    .await?;
                affected(result.rows_affected())
            })
            .await
    }
}
