use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{
    CodSetting, NewOrder, OrderCreatedResponse, PaymentProviderResponse, PricingRules,
    RepositoryError, ServiceError, ServiceResult, COD_PAYMENT_METHOD, COD_PROVIDER_ID,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{CheckoutRepository, OrderRepository, PaymentProviderRepository};

const NOT_ELIGIBLE_MESSAGE: &str = "Payment Method is not eligible for this order total.";

/// Payment provider administration and the cash-on-delivery checkout
pub struct PaymentService {
    provider_repository: Arc<dyn PaymentProviderRepository>,
    checkout_repository: Arc<dyn CheckoutRepository>,
    order_repository: Arc<dyn OrderRepository>,
    pricing: PricingRules,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl PaymentService {
    pub fn new(
        provider_repository: Arc<dyn PaymentProviderRepository>,
        checkout_repository: Arc<dyn CheckoutRepository>,
        order_repository: Arc<dyn OrderRepository>,
        pricing: PricingRules,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            provider_repository,
            checkout_repository,
            order_repository,
            pricing,
            tracer,
        }
    }

    #[instrument(skip(self))]
    pub async fn enabled_providers(&self) -> ServiceResult<Vec<PaymentProviderResponse>> {
        info!("Listing enabled payment providers");

        let providers = self.provider_repository.find_enabled().await?;
        Ok(providers
            .into_iter()
            .map(PaymentProviderResponse::from)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn set_enabled(&self, provider_id: &str, is_enabled: bool) -> ServiceResult<()> {
        crate::info_with_trace!("Toggling payment provider");

        if !self
            .provider_repository
            .set_enabled(provider_id, is_enabled)
            .await?
        {
            return Err(ServiceError::not_found("PaymentProvider", provider_id));
        }
        Ok(())
    }

    /// Place a cash-on-delivery order for a checkout the caller owns
    #[instrument(skip(self, user), fields(checkout_id = %checkout_id, user_id = user.user_id))]
    pub async fn cod_checkout(
        &self,
        checkout_id: Uuid,
        user: &AuthUser,
    ) -> ServiceResult<OrderCreatedResponse> {
        crate::info_with_trace!("Placing cash-on-delivery order");

        let checkout = self
            .checkout_repository
            .find_by_id(checkout_id)
            .await?
            .ok_or(ServiceError::CheckoutNotFound { id: checkout_id })?;
        user.ensure_owner_or_admin(checkout.customer_id)?;

        self.tracer
            .trace_checkout_operation("cod_checkout", checkout.customer_id, async {
                if checkout.is_completed {
                    return Err(ServiceError::CheckoutCompleted { id: checkout_id });
                }

                let setting = self.cod_setting().await?;
                let totals = self.pricing.totals(checkout.sub_total());

                if !setting.is_eligible(totals.order_total) {
                    crate::warn_with_trace!(
                        order_total = %totals.order_total,
                        "Order total outside cash-on-delivery limits"
                    );
                    return Err(ServiceError::PaymentNotEligible {
                        message: NOT_ELIGIBLE_MESSAGE.to_string(),
                    });
                }

                let fee = setting.fee_for(totals.order_total);
                let new_order = NewOrder::from_checkout(
                    &checkout,
                    totals,
                    self.pricing.tax_percent,
                    COD_PAYMENT_METHOD,
                    fee,
                )
                .ok_or_else(|| ServiceError::validation("Shipping information is required"))?;

                let order = match self.order_repository.create_from_checkout(new_order).await {
                    Ok(order) => order,
                    Err(RepositoryError::ConstraintViolation { message }) => {
                        warn!(error = %message, "Order placement rejected");
                        return Err(ServiceError::conflict(message));
                    }
                    Err(e) => return Err(e.into()),
                };

                self.tracer.metrics().record_order_created(COD_PAYMENT_METHOD);
                crate::info_with_trace!(order_id = order.id, "Cash-on-delivery order created");

                Ok(OrderCreatedResponse {
                    success: true,
                    order_id: order.id,
                    next_step: format!("/checkout/success/{}", order.id),
                })
            })
            .await
    }

    async fn cod_setting(&self) -> ServiceResult<CodSetting> {
        let provider = self
            .provider_repository
            .find_by_id(COD_PROVIDER_ID)
            .await?
            .ok_or_else(|| ServiceError::not_found("PaymentProvider", COD_PROVIDER_ID))?;

        CodSetting::from_provider(&provider).map_err(|e| ServiceError::Configuration {
            message: format!("Invalid {} settings: {}", COD_PROVIDER_ID, e),
        })
    }
}
