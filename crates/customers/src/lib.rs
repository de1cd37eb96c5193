//! `storefront-customers` — customer identity and contact details.

pub mod customer;

pub use customer::{Customer, CustomerId, Email};
