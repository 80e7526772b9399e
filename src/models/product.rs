use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ValidationError, ValidationResult};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub display_order: i32,
    pub is_published: bool,
    pub is_visible_individually: bool,
    pub is_deleted: bool,
    pub thumbnail_image_url: Option<String>,
}

impl Product {
    /// Whether the product can be sold at all
    pub fn is_available(&self) -> bool {
        self.is_published && !self.is_deleted
    }

    pub fn has_stock_for(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }
}

/// Attribute value attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
}

/// Attribute name with the values a shopper may pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// Product as rendered in a category listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub thumbnail_image_url: Option<String>,
    pub media_urls: Vec<String>,
    pub attributes: Vec<ProductAttribute>,
}

/// Minimal product projection used by tags and wishlists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub thumbnail_image_url: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            price: product.price,
            old_price: product.old_price,
            thumbnail_image_url: product.thumbnail_image_url.clone(),
        }
    }
}

/// Raw query string of the category product listing
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductListingParams {
    pub categories: Option<String>,
    pub attributes: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Parsed, validated listing query handed to the repository
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub category_ids: Vec<i64>,
    pub attribute_filters: Vec<AttributeFilter>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub page: u32,
    pub page_size: u32,
}

impl ProductQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Whether a product with the given attributes satisfies every attribute group
    pub fn matches_attributes(&self, attributes: &[ProductAttribute]) -> bool {
        self.attribute_filters.iter().all(|filter| {
            attributes
                .iter()
                .any(|attr| attr.name == filter.name && filter.values.contains(&attr.value))
        })
    }

    pub fn matches_price(&self, price: Decimal) -> bool {
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListingResponse {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub items: Vec<ProductListItem>,
    pub available_filters: Vec<AttributeFilter>,
    pub price_range: PriceRange,
}

/// Parse a comma separated list of category ids, ignoring blanks
pub fn parse_category_ids(raw: &str) -> ValidationResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| ValidationError::InvalidFormat {
                field: "categories".to_string(),
                expected: "comma separated category ids".to_string(),
            })
        })
        .collect()
}

/// Parse `Name:v1,v2|Other:v3` into attribute groups
pub fn parse_attribute_filters(raw: &str) -> ValidationResult<Vec<AttributeFilter>> {
    let mut filters = Vec::new();

    for group in raw.split('|').map(str::trim).filter(|g| !g.is_empty()) {
        let (name, values) = group
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "attributes".to_string(),
                expected: "Name:value1,value2|Name2:value3".to_string(),
            })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "attributes.name".to_string(),
            });
        }

        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        if !values.is_empty() {
            filters.push(AttributeFilter {
                name: name.to_string(),
                values,
            });
        }
    }

    Ok(filters)
}

/// Group attribute pairs by name with distinct, sorted values
pub fn group_attribute_values<I>(pairs: I) -> Vec<AttributeFilter>
where
    I: IntoIterator<Item = ProductAttribute>,
{
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for attr in pairs {
        grouped.entry(attr.name).or_default().insert(attr.value);
    }

    grouped
        .into_iter()
        .map(|(name, values)| AttributeFilter {
            name,
            values: values.into_iter().collect(),
        })
        .collect()
}

impl ProductListingParams {
    /// Validate the raw parameters against the resolved category scope
    pub fn into_query(self, scope: Vec<i64>) -> ValidationResult<ProductQuery> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::OutOfRange {
                field: "pageSize".to_string(),
                min: "1".to_string(),
                max: MAX_PAGE_SIZE.to_string(),
                value: page_size.to_string(),
            });
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ValidationError::InvalidValue {
                    field: "minPrice".to_string(),
                    value: min.to_string(),
                    reason: "minPrice cannot exceed maxPrice".to_string(),
                });
            }
        }

        let explicit = match self.categories.as_deref() {
            Some(raw) => parse_category_ids(raw)?,
            None => Vec::new(),
        };

        let attribute_filters = match self.attributes.as_deref() {
            Some(raw) => parse_attribute_filters(raw)?,
            None => Vec::new(),
        };

        Ok(ProductQuery {
            category_ids: if explicit.is_empty() { scope } else { explicit },
            attribute_filters,
            min_price: self.min_price,
            max_price: self.max_price,
            page,
            page_size,
        })
    }
}
