use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ValidationError, ValidationResult};

/// Promotional banner shown on a storefront page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: i64,
    pub title_en: Option<String>,
    pub subtitle_en: Option<String>,
    pub description_en: Option<String>,
    pub title_ar: Option<String>,
    pub subtitle_ar: Option<String>,
    pub description_ar: Option<String>,
    pub link_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub page_type_id: i64,
    pub banner_type_id: i64,
    pub position: i32,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Banner {
    /// Active and inside its optional scheduling window
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.map_or(true, |start| start <= now)
            && self.end_date.map_or(true, |end| end >= now)
    }
}

/// Lookup row for banner page types and banner types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerCode {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BannerQuery {
    pub page_code: Option<String>,
    pub type_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBannerRequest {
    pub page_code: String,
    pub type_code: String,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub subtitle_en: Option<String>,
    #[serde(default)]
    pub description_en: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub subtitle_ar: Option<String>,
    #[serde(default)]
    pub description_ar: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl CreateBannerRequest {
    pub fn validate_schedule(&self) -> ValidationResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::InvalidValue {
                    field: "endDate".to_string(),
                    value: end.to_rfc3339(),
                    reason: "endDate must not be before startDate".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build an unsaved banner once the codes have been resolved to ids
    pub fn into_banner(self, page_type_id: i64, banner_type_id: i64) -> Banner {
        let now = Utc::now();
        Banner {
            id: 0,
            title_en: self.title_en,
            subtitle_en: self.subtitle_en,
            description_en: self.description_en,
            title_ar: self.title_ar,
            subtitle_ar: self.subtitle_ar,
            description_ar: self.description_ar,
            link_url: self.link_url,
            thumbnail_url: self.thumbnail_url,
            page_type_id,
            banner_type_id,
            position: self.position,
            is_active: self.is_active,
            start_date: self.start_date,
            end_date: self.end_date,
            created_on: now,
            updated_on: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerResponse {
    pub id: i64,
    pub title_en: Option<String>,
    pub subtitle_en: Option<String>,
    pub description_en: Option<String>,
    pub title_ar: Option<String>,
    pub subtitle_ar: Option<String>,
    pub description_ar: Option<String>,
    pub link_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub position: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<Banner> for BannerResponse {
    fn from(banner: Banner) -> Self {
        Self {
            id: banner.id,
            title_en: banner.title_en,
            subtitle_en: banner.subtitle_en,
            description_en: banner.description_en,
            title_ar: banner.title_ar,
            subtitle_ar: banner.subtitle_ar,
            description_ar: banner.description_ar,
            link_url: banner.link_url,
            thumbnail_url: banner.thumbnail_url,
            position: banner.position,
            start_date: banner.start_date,
            end_date: banner.end_date,
        }
    }
}

/// Keep live banners and order them by position
pub fn live_banners(banners: Vec<Banner>, now: DateTime<Utc>) -> Vec<BannerResponse> {
    let mut live: Vec<Banner> = banners.into_iter().filter(|b| b.is_live(now)).collect();
    live.sort_by_key(|b| (b.position, b.id));
    live.into_iter().map(BannerResponse::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner(id: i64, position: i32) -> Banner {
        CreateBannerRequest {
            page_code: "home".to_string(),
            type_code: "slider".to_string(),
            position,
            is_active: true,
            ..Default::default()
        }
        .into_banner(1, 1)
        .with_id(id)
    }

    impl Banner {
        fn with_id(mut self, id: i64) -> Self {
            self.id = id;
            self
        }
    }

    #[test]
    fn test_banner_liveness_window() {
        let now = Utc::now();
        let mut b = banner(1, 0);
        assert!(b.is_live(now));

        b.start_date = Some(now + Duration::hours(1));
        assert!(!b.is_live(now));

        b.start_date = Some(now - Duration::days(1));
        b.end_date = Some(now - Duration::hours(1));
        assert!(!b.is_live(now));

        b.end_date = Some(now + Duration::hours(1));
        assert!(b.is_live(now));

        b.is_active = false;
        assert!(!b.is_live(now));
    }

    #[test]
    fn test_live_banners_sorted_by_position() {
        let now = Utc::now();
        let mut hidden = banner(3, 0);
        hidden.is_active = false;

        let result = live_banners(vec![banner(1, 5), banner(2, 1), hidden], now);
        let ids: Vec<i64> = result.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_schedule_validation() {
        let now = Utc::now();
        let request = CreateBannerRequest {
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
            ..Default::default()
        };
        assert!(request.validate_schedule().is_err());
    }
}
