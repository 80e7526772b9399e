// Repositories module - data access layer

pub mod address_repository;
pub mod banner_repository;
pub mod cart_repository;
pub mod category_repository;
pub mod checkout_repository;
pub mod database;
pub mod menu_repository;
pub mod order_repository;
pub mod payment_repository;
pub mod product_repository;
pub mod tag_repository;
pub mod user_repository;
pub mod wishlist_repository;


pub use address_repository::{AddressRepository, PgAddressRepository};
pub use banner_repository::{BannerRepository, PgBannerRepository};
pub use cart_repository::{CartRepository, PgCartRepository};
pub use category_repository::{CategoryRepository, PgCategoryRepository};
pub use checkout_repository::{CheckoutRepository, PgCheckoutRepository};
pub use database::Database;
pub use menu_repository::{MenuRepository, PgMenuRepository};
pub use order_repository::{OrderRepository, PgOrderRepository};
pub use payment_repository::{PaymentProviderRepository, PgPaymentProviderRepository};
pub use product_repository::{PgProductRepository, ProductRepository};
pub use tag_repository::{PgTagRepository, TagRepository};
pub use user_repository::{PgUserRepository, UserRepository};
pub use wishlist_repository::{PgWishListRepository, WishListRepository};
