use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::AuthUser;
use crate::models::{OrderDetailResponse, OrderHistoryItem, ServiceError, ServiceResult};
use crate::repositories::OrderRepository;

/// Read side of customer orders
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, user), fields(user_id = user.user_id))]
    pub async fn order_confirmation(
        &self,
        order_id: i64,
        user: &AuthUser,
    ) -> ServiceResult<OrderDetailResponse> {
        info!("Loading order confirmation");

        let order = self
            .repository
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        user.ensure_owner_or_admin(order.customer_id)?;

        Ok(OrderDetailResponse::from(order))
    }

    /// Orders of a customer, newest first
    #[instrument(skip(self, user), fields(user_id = user.user_id))]
    pub async fn order_history(
        &self,
        customer_id: i64,
        user: &AuthUser,
    ) -> ServiceResult<Vec<OrderHistoryItem>> {
        user.ensure_owner_or_admin(customer_id)?;

        let orders = self.repository.find_by_customer(customer_id).await?;
        info!("Found {} orders", orders.len());

        Ok(orders.into_iter().map(OrderHistoryItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewOrder, Order, OrderItem, OrderStatus, RepositoryError, Role};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use mockall::{mock, predicate::eq};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    mock! {
        TestOrderRepository {}

        #[async_trait]
        impl OrderRepository for TestOrderRepository {
            async fn create_from_checkout(&self, order: NewOrder) -> Result<Order, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<Order>, RepositoryError>;
            async fn find_by_customer(&self, customer_id: i64) -> Result<Vec<Order>, RepositoryError>;
        }
    }

    fn user(user_id: i64, roles: Vec<Role>) -> AuthUser {
        AuthUser {
            user_id,
            email: "shopper@example.com".to_string(),
            name: "Sam Shopper".to_string(),
            roles,
        }
    }

    fn order(id: i64, customer_id: i64, age_days: i64) -> Order {
        Order {
            id,
            customer_id,
            checkout_id: None,
            status: OrderStatus::New,
            shipping_address: None,
            billing_address: None,
            shipping_method: Some("Standard".to_string()),
            payment_method: "CashOnDelivery".to_string(),
            payment_fee_amount: Decimal::ZERO,
            sub_total: dec!(40),
            discount_amount: Decimal::ZERO,
            tax_amount: dec!(4),
            shipping_fee_amount: dec!(5),
            order_total: dec!(49),
            coupon_code: None,
            order_note: None,
            created_on: Utc::now() - Duration::days(age_days),
            items: vec![OrderItem {
                id: id * 10,
                product_id: 3,
                product_name: "Desk Lamp".to_string(),
                product_price: dec!(20),
                quantity: 2,
                discount_amount: Decimal::ZERO,
                tax_amount: dec!(4),
                tax_percent: dec!(10),
            }],
        }
    }

    #[tokio::test]
    async fn test_order_confirmation_for_owner() {
        let mut repo = MockTestOrderRepository::new();
        repo.expect_find_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(order(id, 2, 0))));

        let detail = OrderService::new(Arc::new(repo))
            .order_confirmation(7, &user(2, vec![Role::Customer]))
            .await
            .unwrap();

        assert_eq!(detail.id, 7);
        assert_eq!(detail.shipping_amount, dec!(5));
        assert_eq!(detail.items[0].total, dec!(40));
    }

    #[tokio::test]
    async fn test_order_confirmation_for_stranger() {
        let mut repo = MockTestOrderRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(order(id, 2, 0))));

        let result = OrderService::new(Arc::new(repo))
            .order_confirmation(7, &user(9, vec![Role::Customer]))
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_missing_order() {
        let mut repo = MockTestOrderRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = OrderService::new(Arc::new(repo))
            .order_confirmation(7, &user(1, vec![Role::Admin]))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_order_history_checks_owner_before_loading() {
        let mut repo = MockTestOrderRepository::new();
        repo.expect_find_by_customer().never();

        let result = OrderService::new(Arc::new(repo))
            .order_history(2, &user(9, vec![Role::Customer]))
            .await;
        assert!(matches!(result, Err(ServiceError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_order_history_for_admin() {
        let mut repo = MockTestOrderRepository::new();
        repo.expect_find_by_customer()
            .with(eq(2))
            .returning(|customer_id| Ok(vec![order(8, customer_id, 0), order(5, customer_id, 3)]));

        let history = OrderService::new(Arc::new(repo))
            .order_history(2, &user(1, vec![Role::Admin]))
            .await
            .unwrap();

        let ids: Vec<i64> = history.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![8, 5]);
        assert_eq!(history[0].items.len(), 1);
    }
}
