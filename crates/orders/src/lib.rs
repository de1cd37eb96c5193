//! `storefront-orders` — immutable order records and placement requests.

pub mod order;
pub mod request;

pub use order::{Order, OrderId, OrderLine};
pub use request::{LineRequest, PlaceOrderRequest};
