use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    AddWishListItemRequest, RepositoryError, ServiceError, ServiceResult, Validate,
    WishListItemResponse,
};
use crate::repositories::{ProductRepository, WishListRepository};

/// Per-user wishlists; each product appears at most once
pub struct WishListService {
    wishlist_repository: Arc<dyn WishListRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl WishListService {
    pub fn new(
        wishlist_repository: Arc<dyn WishListRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            wishlist_repository,
            product_repository,
        }
    }

    /// Items of the user's wishlist; empty when the user has none yet
    #[instrument(skip(self))]
    pub async fn get_items(&self, user_id: i64) -> ServiceResult<Vec<WishListItemResponse>> {
        info!("Getting wishlist");

        let Some(wish_list) = self.wishlist_repository.find_by_user(user_id).await? else {
            return Ok(Vec::new());
        };

        let items = self.wishlist_repository.find_items(wish_list.id).await?;
        Ok(items.into_iter().map(WishListItemResponse::from).collect())
    }

    #[instrument(skip(self, request), fields(product_id = request.product_id))]
    pub async fn add_item(&self, user_id: i64, request: AddWishListItemRequest) -> ServiceResult<()> {
        crate::info_with_trace!("Adding product to wishlist");

        request.validate()?;

        if self
            .product_repository
            .find_by_id(request.product_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::ProductNotFound {
                id: request.product_id,
            });
        }

        let wish_list = match self.wishlist_repository.find_by_user(user_id).await? {
            Some(wish_list) => wish_list,
            None => {
                info!("Creating wishlist for user");
                self.wishlist_repository.create(user_id).await?
            }
        };

        if self
            .wishlist_repository
            .contains(wish_list.id, request.product_id)
            .await?
        {
            return Err(duplicate(request.product_id));
        }

        match self
            .wishlist_repository
            .add_item(wish_list.id, request.product_id, request.quantity)
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::ConstraintViolation { .. }) => Err(duplicate(request.product_id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> ServiceResult<()> {
        crate::info_with_trace!("Removing product from wishlist");

        let wish_list = self
            .wishlist_repository
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("WishList", user_id))?;

        if !self
            .wishlist_repository
            .remove_item(wish_list.id, product_id)
            .await?
        {
            return Err(ServiceError::not_found("WishListItem", product_id));
        }
        Ok(())
    }
}

fn duplicate(product_id: i64) -> ServiceError {
    ServiceError::conflict(format!("Product {} is already in the wishlist", product_id))
}
