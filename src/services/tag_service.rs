use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    validate_positive_id, CreateTagRequest, MessageResponse, ProductSummary, ProductTag,
    RepositoryError, ServiceError, ServiceResult, TagMapping, Validate,
};
use crate::repositories::{ProductRepository, TagRepository};

/// Product tags and the product/tag mappings
pub struct TagService {
    tag_repository: Arc<dyn TagRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl TagService {
    pub fn new(
        tag_repository: Arc<dyn TagRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            tag_repository,
            product_repository,
        }
    }

    #[instrument(skip(self))]
    pub async fn products_by_tag(&self, tag_id: i64) -> ServiceResult<Vec<ProductSummary>> {
        info!("Listing products by tag");
        Ok(self.product_repository.find_by_tag(tag_id).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn create_tag(&self, request: CreateTagRequest) -> ServiceResult<ProductTag> {
        crate::info_with_trace!("Creating tag");

        request.validate()?;

        let title_en = request.title_en.unwrap_or_default().trim().to_string();
        let tag = ProductTag::new_manual(title_en, request.title_ar);
        Ok(self.tag_repository.create(tag).await?)
    }

    /// Map a product to a tag; each pair may exist only once
    #[instrument(skip(self), fields(product_id = mapping.product_id, tag_id = mapping.product_tag_id))]
    pub async fn add_mapping(&self, mapping: TagMapping) -> ServiceResult<TagMapping> {
        crate::info_with_trace!("Adding tag mapping");

        validate_positive_id("productId", mapping.product_id)?;
        validate_positive_id("productTagId", mapping.product_tag_id)?;

        if self.tag_repository.mapping_exists(mapping).await? {
            return Err(ServiceError::conflict(format!(
                "Product {} is already mapped to tag {}",
                mapping.product_id, mapping.product_tag_id
            )));
        }

        match self.tag_repository.add_mapping(mapping).await {
            Ok(()) => Ok(mapping),
            // A concurrent insert of the same pair lands on the unique key
            Err(RepositoryError::ConstraintViolation { message }) => {
                Err(ServiceError::conflict(message))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(product_id = mapping.product_id, tag_id = mapping.product_tag_id))]
    pub async fn remove_mapping(&self, mapping: TagMapping) -> ServiceResult<()> {
        if !self.tag_repository.remove_mapping(mapping).await? {
            return Err(ServiceError::not_found(
                "TagMapping",
                format!("{}/{}", mapping.product_id, mapping.product_tag_id),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: i64) -> ServiceResult<MessageResponse> {
        crate::info_with_trace!("Deleting tag");

        if !self.tag_repository.delete(id).await? {
            return Err(ServiceError::not_found("Tag", id));
        }
        Ok(MessageResponse {
            message: format!("Tag {} deleted", id),
        })
    }
}
