use serde::{Deserialize, Serialize};

/// Tag type assigned to tags created by administrators
pub const MANUAL_TAG_TYPE_ID: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTag {
    pub id: i64,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub product_tag_type_id: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
}

/// Product/tag pair used both as body and as query string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMapping {
    pub product_id: i64,
    pub product_tag_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl ProductTag {
    pub fn new_manual(title_en: String, title_ar: Option<String>) -> Self {
        Self {
            id: 0,
            title_en,
            title_ar,
            product_tag_type_id: MANUAL_TAG_TYPE_ID,
            is_active: true,
        }
    }
}
