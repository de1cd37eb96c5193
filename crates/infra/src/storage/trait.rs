use std::sync::Arc;

use thiserror::Error;

use storefront_catalog::{Product, ProductId, Store, StoreId};
use storefront_core::ExpectedVersion;
use storefront_customers::{Customer, CustomerId, Email};
use storefront_inventory::{InventoryKey, InventoryRecord};
use storefront_orders::{Order, OrderId};

/// Storage operation error.
///
/// Infrastructure failures only (concurrency, uniqueness, backend trouble);
/// domain failures live in `storefront_core::DomainError`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Optimistic concurrency check failed (stored version moved on).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// A uniqueness constraint was violated (e.g. customer email taken).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The backend rejected or could not complete the operation.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Customer directory with a uniqueness constraint on email.
///
/// `insert` is the constraint's enforcement point: two concurrent inserts for
/// the same email must leave exactly one record, the loser seeing
/// [`StorageError::UniqueViolation`]. A preliminary `find_by_email` alone is
/// not race-safe; callers retry create-or-fetch on conflict.
pub trait CustomerStore: Send + Sync {
    fn get(&self, id: CustomerId) -> Option<Customer>;
    fn find_by_email(&self, email: &Email) -> Option<Customer>;
    fn insert(&self, customer: Customer) -> Result<(), StorageError>;
}

/// Read access to stores (existence gate for placement).
pub trait StoreDirectory: Send + Sync {
    fn get(&self, store_id: StoreId) -> Option<Store>;

    fn exists(&self, store_id: StoreId) -> bool {
        self.get(store_id).is_some()
    }
}

/// Read access to catalog products.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, product_id: ProductId) -> Option<Product>;
}

/// Versioned inventory records keyed by (product, store).
///
/// `put` commits a record only when the stored version still matches
/// `expected`; otherwise it fails with [`StorageError::Concurrency`] and the
/// caller reloads and retries. That makes read-modify-write cycles on one key
/// serializable without any lock held across them, and keys never contend
/// with each other.
pub trait InventoryStore: Send + Sync {
    fn get(&self, key: &InventoryKey) -> Option<InventoryRecord>;
    fn put(&self, record: InventoryRecord, expected: ExpectedVersion) -> Result<(), StorageError>;
}

/// Order persistence. `insert` writes the header and all lines as one unit;
/// an order value owns its lines, so partial persistence is unrepresentable.
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order) -> Result<(), StorageError>;
    fn get(&self, id: OrderId) -> Option<Order>;
}

impl<T> CustomerStore for Arc<T>
where
    T: CustomerStore + ?Sized,
{
    fn get(&self, id: CustomerId) -> Option<Customer> {
        (**self).get(id)
    }

    fn find_by_email(&self, email: &Email) -> Option<Customer> {
        (**self).find_by_email(email)
    }

    fn insert(&self, customer: Customer) -> Result<(), StorageError> {
        (**self).insert(customer)
    }
}

impl<T> StoreDirectory for Arc<T>
where
    T: StoreDirectory + ?Sized,
{
    fn get(&self, store_id: StoreId) -> Option<Store> {
        (**self).get(store_id)
    }

    fn exists(&self, store_id: StoreId) -> bool {
        (**self).exists(store_id)
    }
}

impl<T> ProductCatalog for Arc<T>
where
    T: ProductCatalog + ?Sized,
{
    fn get(&self, product_id: ProductId) -> Option<Product> {
        (**self).get(product_id)
    }
}

impl<T> InventoryStore for Arc<T>
where
    T: InventoryStore + ?Sized,
{
    fn get(&self, key: &InventoryKey) -> Option<InventoryRecord> {
        (**self).get(key)
    }

    fn put(&self, record: InventoryRecord, expected: ExpectedVersion) -> Result<(), StorageError> {
        (**self).put(record, expected)
    }
}

impl<T> OrderStore for Arc<T>
where
    T: OrderStore + ?Sized,
{
    fn insert(&self, order: Order) -> Result<(), StorageError> {
        (**self).insert(order)
    }

    fn get(&self, id: OrderId) -> Option<Order> {
        (**self).get(id)
    }
}
