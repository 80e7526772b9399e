use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{
    AddCartItemRequest, AddCartItemResponse, CartResponse, Product, ServiceError, ServiceResult,
    UpdateCartItemRequest, Validate,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl CartService {
    /// Create a new CartService
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
            tracer,
        }
    }

    /// Get a customer's cart
    #[instrument(skip(self), fields(customer_id = customer_id))]
    pub async fn get_cart(&self, customer_id: i64) -> ServiceResult<CartResponse> {
        info!("Getting cart for customer");

        let cart = self.cart_repository.find_cart(customer_id).await?;
        let response = CartResponse::from(cart);

        info!("Cart retrieved with {} items", response.items.len());
        Ok(response)
    }

    /// Add a product to the cart, or add to the quantity of its existing line
    #[instrument(skip(self, request), fields(customer_id = customer_id, product_id = request.product_id, quantity = request.quantity))]
    pub async fn add_item(
        &self,
        customer_id: i64,
        request: AddCartItemRequest,
    ) -> ServiceResult<AddCartItemResponse> {
        crate::info_with_trace!("Adding item to cart");

        // Validate inputs
        request.validate()?;

        self.tracer
            .trace_cart_operation("add_item", customer_id, async {
                let product = self.find_sellable_product(request.product_id).await?;

                // Stock must cover what is already in the cart plus the new units
                let cart = self.cart_repository.find_cart(customer_id).await?;
                let requested = cart.product_quantity(product.id) + request.quantity;
                ensure_stock(&product, requested)?;

                let record = self
                    .cart_repository
                    .add_item(customer_id, product.id, request.quantity)
                    .await?;

                crate::info_with_trace!(item_id = record.id, "Item added to cart");
                Ok(AddCartItemResponse {
                    success: true,
                    item_id: record.id,
                    product_id: record.product_id,
                })
            })
            .await
    }

    /// Set the quantity of a line in the customer's cart
    #[instrument(skip(self, request), fields(customer_id = customer_id, item_id = item_id, quantity = request.quantity))]
    pub async fn update_item(
        &self,
        customer_id: i64,
        item_id: i64,
        request: UpdateCartItemRequest,
    ) -> ServiceResult<()> {
        info!("Updating cart item quantity");

        // Validate inputs
        request.validate()?;

        self.tracer
            .trace_cart_operation("update_item", customer_id, async {
                let item = self
                    .cart_repository
                    .find_item(customer_id, item_id)
                    .await?
                    .ok_or(ServiceError::CartItemNotFound {
                        item_id,
                        customer_id,
                    })?;

                let product = self.find_sellable_product(item.product_id).await?;
                ensure_stock(&product, request.quantity)?;

                self.cart_repository
                    .update_quantity(item.id, request.quantity)
                    .await?;
                Ok(())
            })
            .await
    }

    /// Remove a line from the customer's cart
    #[instrument(skip(self), fields(customer_id = customer_id, item_id = item_id))]
    pub async fn remove_item(&self, customer_id: i64, item_id: i64) -> ServiceResult<()> {
        info!("Removing item from cart");

        self.tracer
            .trace_cart_operation("remove_item", customer_id, async {
                if !self.cart_repository.remove_item(customer_id, item_id).await? {
                    warn!("Cart item not found");
                    return Err(ServiceError::CartItemNotFound {
                        item_id,
                        customer_id,
                    });
                }
                Ok(())
            })
            .await
    }

    /// Remove every line from the customer's cart
    #[instrument(skip(self), fields(customer_id = customer_id))]
    pub async fn clear_cart(&self, customer_id: i64) -> ServiceResult<()> {
        info!("Clearing cart");

        self.tracer
            .trace_cart_operation("clear", customer_id, async {
                let removed = self.cart_repository.clear(customer_id).await?;
                info!("Cart cleared, {} lines removed", removed);
                Ok(())
            })
            .await
    }

    async fn find_sellable_product(&self, product_id: i64) -> ServiceResult<Product> {
        let product = self
            .product_repository
            .find_by_id(product_id)
            .await?
            .ok_or(ServiceError::ProductNotFound { id: product_id })?;

        if !product.is_available() {
            return Err(ServiceError::ProductUnavailable { product_id });
        }
        Ok(product)
    }
}

fn ensure_stock(product: &Product, quantity: i32) -> ServiceResult<()> {
    if !product.has_stock_for(quantity) {
        return Err(ServiceError::InsufficientStock {
            product_id: product.id,
            requested: quantity,
            available: product.stock_quantity,
        });
    }
    Ok(())
}
