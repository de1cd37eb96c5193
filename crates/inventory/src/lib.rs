//! `storefront-inventory` — per (product, store) stock records.
//!
//! Pure domain: records and their legal transitions. The atomicity of
//! check-and-decrement under concurrency is the infra ledger's job; this
//! crate only makes illegal states unrepresentable (stock is `u64`, so a
//! negative level cannot exist) and centralizes the arithmetic.

pub mod record;

pub use record::{InventoryKey, InventoryRecord};
