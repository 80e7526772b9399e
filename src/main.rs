use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

use storefront_rs::{
    auth::JwtManager,
    create_app,
    handlers::RequestLimits,
    init_observability,
    observability::BusinessTracingMiddleware,
    repositories::{
        Database, PgAddressRepository, PgBannerRepository, PgCartRepository,
        PgCategoryRepository, PgCheckoutRepository, PgMenuRepository, PgOrderRepository,
        PgPaymentProviderRepository, PgProductRepository, PgTagRepository, PgUserRepository,
        PgWishListRepository,
    },
    services::{
        AccountService, AccountSettings, BannerService, CartService, CategoryService,
        CheckoutService, LoggingEmailSender, MenuService, OrderService, PaymentService,
        TagService, WishListService,
    },
    shutdown_observability, AppServices, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment().context("failed to load configuration")?;

    init_observability(&config.observability)?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    let pool = Database::connect(&config.database)
        .await
        .context("failed to connect to PostgreSQL")?;
    let database = Database::new(pool, metrics.clone());
    if config.database.run_migrations {
        database.migrate().await?;
    }

    let jwt = Arc::new(JwtManager::new(
        config.auth.jwt_key.clone(),
        config.auth.jwt_issuer.clone(),
        config.auth.jwt_audience.clone(),
        config.auth.token_lifetime_secs(),
    ));
    let tracer = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));
    let pricing = config.commerce.pricing_rules();

    // Repositories
    let category_repository = Arc::new(PgCategoryRepository::new(database.clone()));
    let product_repository = Arc::new(PgProductRepository::new(database.clone()));
    let banner_repository = Arc::new(PgBannerRepository::new(database.clone()));
    let menu_repository = Arc::new(PgMenuRepository::new(database.clone()));
    let tag_repository = Arc::new(PgTagRepository::new(database.clone()));
    let cart_repository = Arc::new(PgCartRepository::new(database.clone()));
    let wishlist_repository = Arc::new(PgWishListRepository::new(database.clone()));
    let checkout_repository = Arc::new(PgCheckoutRepository::new(database.clone()));
    let order_repository = Arc::new(PgOrderRepository::new(database.clone()));
    let provider_repository = Arc::new(PgPaymentProviderRepository::new(database.clone()));
    let user_repository = Arc::new(PgUserRepository::new(database.clone()));
    let address_repository = Arc::new(PgAddressRepository::new(database.clone()));
    info!("Repositories initialized successfully");

    let services = AppServices {
        category: Arc::new(CategoryService::new(
            category_repository,
            product_repository.clone(),
            tracer.clone(),
        )),
        banner: Arc::new(BannerService::new(banner_repository)),
        menu: Arc::new(MenuService::new(menu_repository)),
        tag: Arc::new(TagService::new(tag_repository, product_repository.clone())),
        cart: Arc::new(CartService::new(
            cart_repository.clone(),
            product_repository.clone(),
            tracer.clone(),
        )),
        wishlist: Arc::new(WishListService::new(
            wishlist_repository,
            product_repository,
        )),
        checkout: Arc::new(CheckoutService::new(
            checkout_repository.clone(),
            cart_repository,
            address_repository.clone(),
            pricing,
            tracer.clone(),
        )),
        payment: Arc::new(PaymentService::new(
            provider_repository,
            checkout_repository,
            order_repository.clone(),
            pricing,
            tracer,
        )),
        order: Arc::new(OrderService::new(order_repository)),
        account: Arc::new(AccountService::new(
            user_repository,
            address_repository,
            jwt.clone(),
            Arc::new(LoggingEmailSender),
            AccountSettings {
                password_reset_lifetime: chrono::Duration::minutes(
                    config.auth.password_reset_lifetime_minutes,
                ),
                frontend_url: config.commerce.frontend_url.clone(),
                default_culture: config.commerce.default_culture.clone(),
            },
        )),
    };
    info!("Services initialized successfully");

    let limits = RequestLimits {
        max_request_size: config.server.max_request_size as u64,
    };
    let app = create_app(services, jwt, metrics, Some(database), limits)
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
