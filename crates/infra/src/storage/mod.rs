//! Storage seams for the placement core.
//!
//! The upstream CRUD collaborators are modeled as a small capability set
//! (find-by-id, find-by-email, save) behind traits, so the workflow is
//! testable against in-memory stores and swappable with real backends
//! without touching orchestration code.

mod in_memory;
mod r#trait;

pub use in_memory::{
    InMemoryCustomerStore, InMemoryInventoryStore, InMemoryOrderStore, InMemoryProductCatalog,
    InMemoryStoreDirectory,
};
pub use r#trait::{
    CustomerStore, InventoryStore, OrderStore, ProductCatalog, StorageError, StoreDirectory,
};
