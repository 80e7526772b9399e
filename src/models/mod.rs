// Re-export all model types
pub use self::banner::*;
pub use self::cart::*;
pub use self::category::*;
pub use self::checkout::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::menu::*;
pub use self::order::*;
pub use self::payment::*;
pub use self::product::*;
pub use self::tag::*;
pub use self::tree::*;
pub use self::user::*;
pub use self::validation::*;
pub use self::wishlist::*;

mod banner;
mod cart;
mod category;
mod checkout;
mod enums;
mod errors;
mod menu;
mod order;
mod payment;
mod product;
mod tag;
mod tree;
mod user;
mod validation;
mod wishlist;
