use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BannerResponse;

/// Catalog category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub meta_title: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub display_order: i32,
    pub parent_id: Option<i64>,
    pub include_in_menu: bool,
    pub is_published: bool,
    pub is_deleted: bool,
    pub thumbnail_image_url: Option<String>,
    pub created_on: DateTime<Utc>,
    pub latest_updated_on: DateTime<Utc>,
}

/// Create/update payload for a category
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub include_in_menu: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub thumbnail_image_url: Option<String>,
}

/// Row in the category listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub display_order: i32,
    pub include_in_menu: bool,
    pub is_published: bool,
    pub parent_id: Option<i64>,
}

/// Full category view returned by id and slug lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub meta_title: Option<String>,
    pub meta_keywords: Option<String>,
    pub meta_description: Option<String>,
    pub display_order: i32,
    pub parent_id: Option<i64>,
    pub include_in_menu: bool,
    pub is_published: bool,
    pub thumbnail_image_url: Option<String>,
}

/// Category by slug with its storefront decorations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPageResponse {
    pub category: CategoryDetail,
    pub banners: Vec<BannerResponse>,
    pub children: Vec<CategoryListItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySlugQuery {
    pub slug: Option<String>,
}

/// Placement of a product inside a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: i64,
    pub product_id: i64,
    pub category_id: i64,
    pub is_featured_product: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductCategoryRequest {
    pub is_featured_product: bool,
    pub display_order: i32,
}

impl Category {
    /// Build an unsaved category; the repository assigns the id.
    pub fn new(form: CategoryForm) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: form.name.trim().to_string(),
            slug: form.slug.trim().to_string(),
            description: form.description,
            meta_title: form.meta_title,
            meta_keywords: form.meta_keywords,
            meta_description: form.meta_description,
            display_order: form.display_order,
            parent_id: form.parent_id,
            include_in_menu: form.include_in_menu,
            is_published: form.is_published,
            is_deleted: false,
            thumbnail_image_url: form.thumbnail_image_url,
            created_on: now,
            latest_updated_on: now,
        }
    }

    /// Overwrite editable fields from a form
    pub fn apply(&mut self, form: CategoryForm) {
        self.name = form.name.trim().to_string();
        self.slug = form.slug.trim().to_string();
        self.description = form.description;
        self.meta_title = form.meta_title;
        self.meta_keywords = form.meta_keywords;
        self.meta_description = form.meta_description;
        self.display_order = form.display_order;
        self.parent_id = form.parent_id;
        self.include_in_menu = form.include_in_menu;
        self.is_published = form.is_published;
        self.thumbnail_image_url = form.thumbnail_image_url;
        self.latest_updated_on = Utc::now();
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.latest_updated_on = Utc::now();
    }

    pub fn is_visible(&self) -> bool {
        self.is_published && !self.is_deleted
    }
}

impl From<&Category> for CategoryListItem {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            display_order: category.display_order,
            include_in_menu: category.include_in_menu,
            is_published: category.is_published,
            parent_id: category.parent_id,
        }
    }
}

impl From<Category> for CategoryDetail {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            meta_title: category.meta_title,
            meta_keywords: category.meta_keywords,
            meta_description: category.meta_description,
            display_order: category.display_order,
            parent_id: category.parent_id,
            include_in_menu: category.include_in_menu,
            is_published: category.is_published,
            thumbnail_image_url: category.thumbnail_image_url,
        }
    }
}
