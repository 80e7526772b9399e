use async_trait::async_trait;
use tracing::instrument;

use super::Database;
use crate::models::{
    Address, AddressForm, AddressType, Country, District, RepositoryError, RepositoryResult,
    StateOrProvince, UserAddress,
};

/// Address book entries and the geography lookups used by address forms
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_user_addresses(
        &self,
        user_id: i64,
        address_type: AddressType,
    ) -> RepositoryResult<Vec<UserAddress>>;

    /// A user address, only when it belongs to the user
    async fn find_user_address(
        &self,
        user_id: i64,
        user_address_id: i64,
    ) -> RepositoryResult<Option<UserAddress>>;

    async fn add_user_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        form: &AddressForm,
    ) -> RepositoryResult<UserAddress>;

    async fn update_address(&self, address_id: i64, form: &AddressForm) -> RepositoryResult<()>;

    /// Point the user's default shipping or billing slot at a user address
    async fn set_default_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        user_address_id: i64,
    ) -> RepositoryResult<()>;

    async fn find_shipping_countries(&self) -> RepositoryResult<Vec<Country>>;

    async fn find_states(&self, country_id: &str) -> RepositoryResult<Vec<StateOrProvince>>;

    async fn find_districts(&self, state_or_province_id: i64) -> RepositoryResult<Vec<District>>;
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserAddressRow {
    pub(super) id: i64,
    pub(super) user_id: i64,
    pub(super) address_type: String,
    pub(super) address_id: i64,
    pub(super) contact_name: String,
    pub(super) phone: String,
    pub(super) address_line1: String,
    pub(super) address_line2: Option<String>,
    pub(super) city: Option<String>,
    pub(super) zip_code: Option<String>,
    pub(super) district_id: Option<i64>,
    pub(super) state_or_province_id: i64,
    pub(super) country_id: String,
}

impl TryFrom<UserAddressRow> for UserAddress {
    type Error = RepositoryError;

    fn try_from(row: UserAddressRow) -> Result<Self, Self::Error> {
        let address_type = row
            .address_type
            .parse::<AddressType>()
            .map_err(|message| RepositoryError::DataCorruption { message })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            address_type,
            address: Address {
                id: row.address_id,
                contact_name: row.contact_name,
                phone: row.phone,
                address_line1: row.address_line1,
                address_line2: row.address_line2,
                city: row.city,
                zip_code: row.zip_code,
                district_id: row.district_id,
                state_or_province_id: row.state_or_province_id,
                country_id: row.country_id,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CountryRow {
    id: String,
    name: String,
    is_shipping_enabled: bool,
}

const USER_ADDRESS_SELECT: &str = "SELECT ua.id, ua.user_id, ua.address_type, a.id AS address_id, \
     a.contact_name, a.phone, a.address_line1, a.address_line2, a.city, a.zip_code, \
     a.district_id, a.state_or_province_id, a.country_id \
     FROM user_addresses ua JOIN addresses a ON a.id = ua.address_id";

pub struct PgAddressRepository {
    db: Database,
}

impl PgAddressRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    #[instrument(skip(self))]
    async fn find_user_addresses(
        &self,
        user_id: i64,
        address_type: AddressType,
    ) -> RepositoryResult<Vec<UserAddress>> {
        self.db
            .trace("select", "user_addresses", async {
                let rows = sqlx::query_as::<_, UserAddressRow>(&format!(
                    "{} WHERE ua.user_id = $1 AND ua.address_type = $2 ORDER BY ua.id",
                    USER_ADDRESS_SELECT
                ))
                .bind(user_id)
                .bind(address_type.to_string())
                .fetch_all(self.db.pool())
                .await?;
                rows.into_iter().map(UserAddress::try_from).collect()
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_user_address(
        &self,
        user_id: i64,
        user_address_id: i64,
    ) -> RepositoryResult<Option<UserAddress>> {
        self.db
            .trace("select", "user_addresses", async {
                let row = sqlx::query_as::<_, UserAddressRow>(&format!(
                    "{} WHERE ua.user_id = $1 AND ua.id = $2",
                    USER_ADDRESS_SELECT
                ))
                .bind(user_id)
                .bind(user_address_id)
                .fetch_optional(self.db.pool())
                .await?;
                row.map(UserAddress::try_from).transpose()
            })
            .await
    }

    #[instrument(skip(self, form))]
    async fn add_user_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        form: &AddressForm,
    ) -> RepositoryResult<UserAddress> {
        self.db
            .trace("insert", "user_addresses", async {
                let mut tx = self.db.pool().begin().await?;

                let address_id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO addresses (
                        contact_name, phone, address_line1, address_line2, city, zip_code,
                        district_id, state_or_province_id, country_id
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING id
                    "#,
                )
                .bind(&form.contact_name)
                .bind(&form.phone)
                .bind(&form.address_line1)
                .bind(&form.address_line2)
                .bind(&form.city)
                .bind(&form.zip_code)
                .bind(form.district_id)
                .bind(form.state_or_province_id)
                .bind(&form.country_id)
                .fetch_one(&mut *tx)
                .await?;

                let user_address_id: i64 = sqlx::query_scalar(
                    "INSERT INTO user_addresses (user_id, address_id, address_type) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(user_id)
                .bind(address_id)
                .bind(address_type.to_string())
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;

                Ok(UserAddress {
                    id: user_address_id,
                    user_id,
                    address_type,
                    address: Address {
                        id: address_id,
                        contact_name: form.contact_name.clone(),
                        phone: form.phone.clone(),
                        address_line1: form.address_line1.clone(),
                        address_line2: form.address_line2.clone(),
                        city: form.city.clone(),
                        zip_code: form.zip_code.clone(),
                        district_id: form.district_id,
                        state_or_province_id: form.state_or_province_id,
                        country_id: form.country_id.clone(),
                    },
                })
            })
            .await
    }

    #[instrument(skip(self, form))]
    async fn update_address(&self, address_id: i64, form: &AddressForm) -> RepositoryResult<()> {
        self.db
            .trace("update", "addresses", async {
                let result = sqlx::query(
                    r#"
                    UPDATE addresses SET
                        contact_name = $2, phone = $3, address_line1 = $4, address_line2 = $5,
                        city = $6, zip_code = $7, district_id = $8, state_or_province_id = $9,
                        country_id = $10
                    WHERE id = $1
                    "#,
                )
                .bind(address_id)
                .bind(&form.contact_name)
                .bind(&form.phone)
                .bind(&form.address_line1)
                .bind(&form.address_line2)
                .bind(&form.city)
                .bind(&form.zip_code)
                .bind(form.district_id)
                .bind(form.state_or_province_id)
                .bind(&form.country_id)
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
    async fn set_default_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        user_address_id: i64,
    ) -> RepositoryResult<()> {
        let sql = match address_type {
            AddressType::Shipping => "UPDATE users SET default_shipping_address_id = $2 WHERE id = $1",
            AddressType::Billing => "UPDATE users SET default_billing_address_id = $2 WHERE id = $1",
        };
        self.db
            .trace("update_default_address", "users", async {
                let result = sqlx::query(sql)
                    .bind(user_id)
                    .bind(user_address_id)
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
    async fn find_shipping_countries(&self) -> RepositoryResult<Vec<Country>> {
        self.db
            .trace("select", "countries", async {
                let rows = sqlx::query_as::<_, CountryRow>(
                    "SELECT id, name, is_shipping_enabled FROM countries \
                     WHERE is_shipping_enabled = TRUE ORDER BY name",
                )
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|row| Country {
                        id: row.id,
                        name: row.name,
                        is_shipping_enabled: row.is_shipping_enabled,
                    })
                    .collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_states(&self, country_id: &str) -> RepositoryResult<Vec<StateOrProvince>> {
        self.db
            .trace("select", "states_or_provinces", async {
                let rows = sqlx::query_as::<_, (i64, String, String)>(
                    "SELECT id, country_id, name FROM states_or_provinces \
                     WHERE country_id = $1 ORDER BY name",
                )
                .bind(country_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|(id, country_id, name)| StateOrProvince {
                        id,
                        country_id,
                        name,
                    })
                    .collect())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_districts(&self, state_or_province_id: i64) -> RepositoryResult<Vec<District>> {
        self.db
            .trace("select", "districts", async {
                let rows = sqlx::query_as::<_, (i64, i64, String)>(
                    "SELECT id, state_or_province_id, name FROM districts \
                     WHERE state_or_province_id = $1 ORDER BY name",
                )
                .bind(state_or_province_id)
                .fetch_all(self.db.pool())
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|(id, state_or_province_id, name)| District {
                        id,
                        state_or_province_id,
                        name,
                    })
                    .collect())
            })
            .await
    }
}
