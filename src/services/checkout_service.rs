use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{
    AddressForm, AddressOption, AddressType, Checkout, CheckoutItem, CheckoutResultResponse,
    CreateCheckoutRequest, CreateCheckoutResponse, DeliveryInformation, DistrictOption,
    NextStepResponse, OrderTotals, PricingRules, SaveDeliveryRequest, ServiceError, ServiceResult,
    ShippingData, Validate,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{AddressRepository, CartRepository, CheckoutRepository};

/// Checkout flow: cart snapshot, delivery step and price recomputation
pub struct CheckoutService {
    checkout_repository: Arc<dyn CheckoutRepository>,
    cart_repository: Arc<dyn CartRepository>,
    address_repository: Arc<dyn AddressRepository>,
    pricing: PricingRules,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl CheckoutService {
    pub fn new(
        checkout_repository: Arc<dyn CheckoutRepository>,
        cart_repository: Arc<dyn CartRepository>,
        address_repository: Arc<dyn AddressRepository>,
        pricing: PricingRules,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            checkout_repository,
            cart_repository,
            address_repository,
            pricing,
            tracer,
        }
    }

    /// Snapshot every line of the caller's cart into a new checkout
    #[instrument(skip(self, request), fields(customer_id = customer_id))]
    pub async fn create_checkout(
        &self,
        customer_id: i64,
        request: CreateCheckoutRequest,
    ) -> ServiceResult<CreateCheckoutResponse> {
        crate::info_with_trace!("Creating checkout");

        self.tracer
            .trace_checkout_operation("create_checkout", customer_id, async {
                let cart = self.cart_repository.find_cart(customer_id).await?;
                if cart.items.is_empty() {
                    return Err(ServiceError::EmptyCart { customer_id });
                }

                let items = cart
                    .items
                    .into_iter()
                    .map(|item| CheckoutItem {
                        product_id: item.product_id,
                        product_name: item.product_name,
                        product_price: item.unit_price,
                        quantity: item.quantity,
                    })
                    .collect();

                let checkout = Checkout::new(customer_id, request.coupon_code, items);
                self.checkout_repository.create(&checkout).await?;

                crate::info_with_trace!(checkout_id = %checkout.id, "Checkout created");
                Ok(CreateCheckoutResponse {
                    checkout_id: checkout.id,
                })
            })
            .await
    }

    /// Load a checkout the caller owns, or any checkout for an administrator
    pub async fn load_owned(&self, checkout_id: Uuid, user: &AuthUser) -> ServiceResult<Checkout> {
        let checkout = self
            .checkout_repository
            .find_by_id(checkout_id)
            .await?
            .ok_or(ServiceError::CheckoutNotFound { id: checkout_id })?;

        user.ensure_owner_or_admin(checkout.customer_id)?;
        Ok(checkout)
    }

    #[instrument(skip(self, user), fields(checkout_id = %checkout_id, user_id = user.user_id))]
    pub async fn delivery_information(
        &self,
        checkout_id: Uuid,
        user: &AuthUser,
    ) -> ServiceResult<DeliveryInformation> {
        info!("Loading delivery information");

        let checkout = self.load_owned(checkout_id, user).await?;
        let customer_id = checkout.customer_id;

        let shipping = self
            .address_repository
            .find_user_addresses(customer_id, AddressType::Shipping)
            .await?;
        let billing = self
            .address_repository
            .find_user_addresses(customer_id, AddressType::Billing)
            .await?;
        let shippable_countries = self.address_repository.find_shipping_countries().await?;

        Ok(DeliveryInformation {
            checkout_id,
            shipping_address_id: shipping.first().map(|a| a.id),
            existing_shipping_addresses: shipping.into_iter().map(AddressOption::from).collect(),
            existing_billing_addresses: billing.into_iter().map(AddressOption::from).collect(),
            use_shipping_address_as_billing_address: true,
            shippable_countries,
        })
    }

    /// Store shipping and billing addresses plus the shipping method
    #[instrument(skip(self, user, request), fields(checkout_id = %checkout_id, user_id = user.user_id))]
    pub async fn save_delivery_information(
        &self,
        checkout_id: Uuid,
        user: &AuthUser,
        request: SaveDeliveryRequest,
    ) -> ServiceResult<NextStepResponse> {
        crate::info_with_trace!("Saving delivery information");

        let checkout = self.load_owned(checkout_id, user).await?;
        let customer_id = checkout.customer_id;

        self.tracer
            .trace_checkout_operation("save_shipping", customer_id, async {
                let shipping_address = self
                    .resolve_address(
                        customer_id,
                        request.shipping_address_id,
                        request.new_address_form,
                        "shipping",
                    )
                    .await?;

                let billing_address = if request.use_shipping_address_as_billing_address {
                    shipping_address.clone()
                } else {
                    self.resolve_address(
                        customer_id,
                        request.billing_address_id,
                        request.new_billing_address_form,
                        "billing",
                    )
                    .await?
                };

                let shipping_method = match request.shipping_method.trim() {
                    "" => return Err(ServiceError::validation("shippingMethod is required")),
                    method => method.to_string(),
                };

                let data = ShippingData {
                    shipping_address,
                    billing_address,
                    shipping_method,
                    order_note: request.order_note,
                };
                self.checkout_repository
                    .save_shipping(checkout_id, &data)
                    .await?;

                Ok(NextStepResponse {
                    success: true,
                    next_step: format!("/checkout/{}/payment", checkout_id),
                })
            })
            .await
    }

    /// Recompute shipping and tax for the checkout and persist them
    #[instrument(skip(self, user), fields(checkout_id = %checkout_id, user_id = user.user_id))]
    pub async fn update_tax_and_shipping(
        &self,
        checkout_id: Uuid,
        user: &AuthUser,
    ) -> ServiceResult<OrderTotals> {
        let checkout = self.load_owned(checkout_id, user).await?;

        self.tracer
            .trace_checkout_operation("update_prices", checkout.customer_id, async {
                let totals = self.pricing.totals(checkout.sub_total());
                self.checkout_repository
                    .update_prices(checkout_id, totals.shipping_amount, totals.tax_amount)
                    .await?;

                info!(order_total = %totals.order_total, "Checkout prices updated");
                Ok(totals)
            })
            .await
    }

    pub fn success(&self, order_id: i64) -> CheckoutResultResponse {
        CheckoutResultResponse {
            order_id,
            message: None,
        }
    }

    pub fn error(&self, order_id: i64) -> CheckoutResultResponse {
        CheckoutResultResponse {
            order_id,
            message: Some("Payment failed".to_string()),
        }
    }

    #[instrument(skip(self))]
    pub async fn districts(&self, state_or_province_id: i64) -> ServiceResult<Vec<DistrictOption>> {
        let districts = self
            .address_repository
            .find_districts(state_or_province_id)
            .await?;
        Ok(districts.into_iter().map(DistrictOption::from).collect())
    }

    /// An existing address of the user wins over a new form
    async fn resolve_address(
        &self,
        user_id: i64,
        existing_id: Option<i64>,
        new_form: Option<AddressForm>,
        kind: &str,
    ) -> ServiceResult<AddressForm> {
        if let Some(id) = existing_id.filter(|id| *id > 0) {
            let address = self
                .address_repository
                .find_user_address(user_id, id)
                .await?
                .ok_or_else(|| {
                    ServiceError::validation(format!("Unknown {} address: {}", kind, id))
                })?;
            return Ok(AddressForm::from(address.address));
        }

        match new_form {
            Some(form) => {
                form.validate()?;
                Ok(form)
            }
            None => Err(ServiceError::validation(format!(
                "A {} address is required",
                kind
            ))),
        }
    }
}
