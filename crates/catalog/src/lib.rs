//! `storefront-catalog` — product and store entities.
//!
//! Read-only collaborators from the order-placement core's perspective:
//! the placement workflow looks products and stores up but never mutates them.

pub mod product;
pub mod store;

pub use product::{Product, ProductId};
pub use store::{Store, StoreId};
