pub mod account;
pub mod banner;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod extract;
pub mod health;
pub mod menu;
pub mod metrics;
pub mod middleware;
pub mod orders;
pub mod payment;
pub mod tag;
pub mod wishlist;

pub use account::create_account_router;
pub use banner::create_banner_router;
pub use cart::create_cart_router;
pub use catalog::create_catalog_router;
pub use checkout::create_checkout_router;
pub use error::{error_body, service_error_to_response, HandlerError};
pub use extract::ValidJson;
pub use health::{create_operational_router, health_check};
pub use menu::create_menu_router;
pub use metrics::metrics_handler;
pub use middleware::{
    cors_middleware, request_validation_middleware, security_headers_middleware, RequestLimits,
};
pub use orders::create_order_router;
pub use payment::create_payment_router;
pub use tag::create_tag_router;
pub use wishlist::create_wishlist_router;

use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;

use crate::auth::JwtManager;
use crate::observability::{observability_middleware, Metrics};
use crate::repositories::Database;
use crate::services::{
    AccountService, BannerService, CartService, CategoryService, CheckoutService, MenuService,
    OrderService, PaymentService, TagService, WishListService,
};

/// Every service the HTTP surface talks to
#[derive(Clone)]
pub struct AppServices {
    pub category: Arc<CategoryService>,
    pub banner: Arc<BannerService>,
    pub menu: Arc<MenuService>,
    pub tag: Arc<TagService>,
    pub cart: Arc<CartService>,
    pub wishlist: Arc<WishListService>,
    pub checkout: Arc<CheckoutService>,
    pub payment: Arc<PaymentService>,
    pub order: Arc<OrderService>,
    pub account: Arc<AccountService>,
}

/// Merge the area routers and wrap them in the shared middleware stack
pub fn create_app(
    services: AppServices,
    jwt: Arc<JwtManager>,
    metrics: Arc<Metrics>,
    database: Option<Database>,
    limits: RequestLimits,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .merge(create_operational_router(metrics, database))
        .merge(create_catalog_router(services.category, jwt.clone()))
        .merge(create_banner_router(services.banner, jwt.clone()))
        .merge(create_menu_router(services.menu, jwt.clone()))
        .merge(create_tag_router(services.tag, jwt.clone()))
        .merge(create_cart_router(services.cart, jwt.clone()))
        .merge(create_wishlist_router(services.wishlist, jwt.clone()))
        .merge(create_checkout_router(services.checkout, jwt.clone()))
        .merge(create_payment_router(services.payment, jwt.clone()))
        .merge(create_order_router(services.order, jwt.clone()))
        .merge(create_account_router(services.account, jwt))
        // Outer to inner
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(cors_middleware))
        .layer(axum_middleware::from_fn_with_state(
            limits,
            request_validation_middleware,
        ))
        .layer(axum_middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
