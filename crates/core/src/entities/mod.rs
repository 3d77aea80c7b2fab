//! Tagged domain records shared between the remote store and the local cache.
//!
//! Every record that crosses the cache or remote boundary is one of these
//! explicit types; (de)serialization through them is what validates shape at
//! that boundary.

pub mod cart;
pub mod customer;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;
pub mod wishlist;

pub use cart::{Cart, CartLine};
pub use customer::Customer;
pub use notification::Notification;
pub use order::Order;
pub use product::Product;
pub use review::Review;
pub use wishlist::WishlistItem;
