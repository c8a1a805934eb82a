pub mod discount;
pub mod shop;

pub use discount::{Discount, DiscountListing, DiscountUpdate, NewDiscount};
pub use shop::{Credentials, NewShop, PasswordChange, Shop, ShopInfoUpdate, ShopWithHash};
