// Services module - business logic layer

pub mod account_service;
pub mod banner_service;
pub mod cart_service;
pub mod category_service;
pub mod checkout_service;
pub mod menu_service;
pub mod notification;
pub mod order_service;
pub mod payment_service;
pub mod tag_service;
pub mod wishlist_service;

pub use account_service::{AccountService, AccountSettings};
pub use banner_service::BannerService;
pub use cart_service::CartService;
pub use category_service::CategoryService;
pub use checkout_service::CheckoutService;
pub use menu_service::MenuService;
pub use notification::{EmailMessage, EmailSender, LoggingEmailSender, NotificationError};
pub use order_service::OrderService;
pub use payment_service::PaymentService;
pub use tag_service::TagService;
pub use wishlist_service::WishListService;
