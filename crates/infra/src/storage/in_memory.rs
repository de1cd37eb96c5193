use std::collections::HashMap;
use std::sync::RwLock;

use storefront_catalog::{Product, ProductId, Store, StoreId};
use storefront_core::ExpectedVersion;
use storefront_customers::{Customer, CustomerId, Email};
use storefront_inventory::{InventoryKey, InventoryRecord};
use storefront_orders::{Order, OrderId};

use super::r#trait::{
    CustomerStore, InventoryStore, OrderStore, ProductCatalog, StorageError, StoreDirectory,
};

#[derive(Debug, Default)]
struct CustomerMaps {
    by_id: HashMap<CustomerId, Customer>,
    by_email: HashMap<Email, CustomerId>,
}

/// In-memory customer directory with a unique index on email.
///
/// Intended for tests/dev. The email index is checked and updated under the
/// same write-lock acquisition as the record insert, which is what gives the
/// atomic create-or-conflict semantics the resolver relies on.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    inner: RwLock<CustomerMaps>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn get(&self, id: CustomerId) -> Option<Customer> {
        let maps = self.inner.read().ok()?;
        maps.by_id.get(&id).cloned()
    }

    fn find_by_email(&self, email: &Email) -> Option<Customer> {
        let maps = self.inner.read().ok()?;
        let id = maps.by_email.get(email)?;
        maps.by_id.get(id).cloned()
    }

    fn insert(&self, customer: Customer) -> Result<(), StorageError> {
        let mut maps = self
            .inner
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        if maps.by_email.contains_key(customer.email()) {
            return Err(StorageError::UniqueViolation(format!(
                "customer email already registered: {}",
                customer.email()
            )));
        }

        maps.by_email
            .insert(customer.email().clone(), customer.id_typed());
        maps.by_id.insert(customer.id_typed(), customer);
        Ok(())
    }
}

/// In-memory store directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStoreDirectory {
    inner: RwLock<HashMap<StoreId, Store>>,
}

impl InMemoryStoreDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, store: Store) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(store.id_typed(), store);
        }
    }
}

impl StoreDirectory for InMemoryStoreDirectory {
    fn get(&self, store_id: StoreId) -> Option<Store> {
        let map = self.inner.read().ok()?;
        map.get(&store_id).cloned()
    }
}

/// In-memory product catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(product.id_typed(), product);
        }
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, product_id: ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(&product_id).cloned()
    }
}

/// In-memory versioned inventory store for tests/dev.
///
/// The version comparison and the write happen under one write-lock
/// acquisition; the lock is never held across a caller's read-modify-write
/// cycle. Contention is therefore resolved by the version check, per key.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: RwLock<HashMap<InventoryKey, InventoryRecord>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get(&self, key: &InventoryKey) -> Option<InventoryRecord> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn put(&self, record: InventoryRecord, expected: ExpectedVersion) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        let current = map.get(record.key()).map(|r| r.version()).unwrap_or(0);
        if !expected.matches(current) {
            return Err(StorageError::Concurrency(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        map.insert(*record.key(), record);
        Ok(())
    }
}

/// In-memory order store for tests/dev. An [`Order`] owns its lines, so a
/// single map insert persists header and lines together.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> Result<(), StorageError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        if map.contains_key(&order.id_typed()) {
            return Err(StorageError::UniqueViolation(format!(
                "order already persisted: {}",
                order.id_typed()
            )));
        }

        map.insert(order.id_typed(), order);
        Ok(())
    }

    fn get(&self, id: OrderId) -> Option<Order> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }
}
