use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    live_banners, BannerCode, BannerQuery, BannerResponse, CreateBannerRequest, IdResponse,
    ServiceError, ServiceResult,
};
use crate::repositories::BannerRepository;

/// Banners grouped by page code and banner type code
pub struct BannerService {
    repository: Arc<dyn BannerRepository>,
}

impl BannerService {
    pub fn new(repository: Arc<dyn BannerRepository>) -> Self {
        Self { repository }
    }

    /// Live banners for a page/type pair, ordered by position
    #[instrument(skip(self), fields(page_code = ?query.page_code, type_code = ?query.type_code))]
    pub async fn get_banners(&self, query: BannerQuery) -> ServiceResult<Vec<BannerResponse>> {
        info!("Getting banners");

        let page_code = required_code("pageCode", query.page_code.as_deref())?;
        let type_code = required_code("typeCode", query.type_code.as_deref())?;
        let (page_type, banner_type) = self.resolve_codes(page_code, type_code).await?;

        let banners = self
            .repository
            .find_by_types(page_type.id, banner_type.id)
            .await?;
        Ok(live_banners(banners, Utc::now()))
    }

    #[instrument(skip(self, request), fields(page_code = %request.page_code, type_code = %request.type_code))]
    pub async fn create_banner(&self, request: CreateBannerRequest) -> ServiceResult<IdResponse> {
        crate::info_with_trace!("Creating banner");

        request.validate_schedule()?;
        let page_code = required_code("pageCode", Some(request.page_code.as_str()))?.to_string();
        let type_code = required_code("typeCode", Some(request.type_code.as_str()))?.to_string();
        let (page_type, banner_type) = self.resolve_codes(&page_code, &type_code).await?;

        let banner = self
            .repository
            .create(request.into_banner(page_type.id, banner_type.id))
            .await?;

        crate::info_with_trace!(banner_id = banner.id, "Banner created");
        Ok(IdResponse { id: banner.id })
    }

    async fn resolve_codes(
        &self,
        page_code: &str,
        type_code: &str,
    ) -> ServiceResult<(BannerCode, BannerCode)> {
        let page_type = self
            .repository
            .find_page_type(page_code)
            .await?
            .ok_or_else(|| ServiceError::validation(format!("Unknown page code: {}", page_code)))?;

        let banner_type = self
            .repository
            .find_banner_type(type_code)
            .await?
            .ok_or_else(|| ServiceError::validation(format!("Unknown banner type code: {}", type_code)))?;

        Ok((page_type, banner_type))
    }
}

fn required_code<'a>(field: &str, value: Option<&'a str>) -> ServiceResult<&'a str> {
    match value.map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(ServiceError::validation(format!("{} is required", field))),
    }
}
