use serde::{Deserialize, Serialize};

use storefront_catalog::{ProductId, StoreId};
use storefront_core::{DomainError, DomainResult, ValueObject};

/// Unique key of an inventory record: one record per (product, store) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub product_id: ProductId,
    pub store_id: StoreId,
}

impl InventoryKey {
    pub fn new(product_id: ProductId, store_id: StoreId) -> Self {
        Self {
            product_id,
            store_id,
        }
    }
}

impl ValueObject for InventoryKey {}

impl core::fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.product_id, self.store_id)
    }
}

/// Stock level for one (product, store) pair.
///
/// `version` increments on every committed mutation and backs the optimistic
/// concurrency check in the inventory store. `reserved`/`released` are pure:
/// they return the next record state without touching shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    key: InventoryKey,
    stock_level: u64,
    version: u64,
}

impl InventoryRecord {
    pub fn new(key: InventoryKey, stock_level: u64) -> Self {
        Self {
            key,
            stock_level,
            version: 1,
        }
    }

    pub fn key(&self) -> &InventoryKey {
        &self.key
    }

    pub fn stock_level(&self) -> u64 {
        self.stock_level
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether `quantity` units could be reserved right now.
    pub fn has_sufficient_stock(&self, quantity: u64) -> bool {
        self.stock_level >= quantity
    }

    /// Next state after reserving `quantity` units.
    pub fn reserved(&self, quantity: u64) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let stock_level = self.stock_level.checked_sub(quantity).ok_or_else(|| {
            DomainError::invariant(format!(
                "insufficient stock for {}: requested {quantity}, available {}",
                self.key, self.stock_level
            ))
        })?;
        Ok(Self {
            key: self.key,
            stock_level,
            version: self.version + 1,
        })
    }

    /// Next state after releasing `quantity` units (compensating increment).
    pub fn released(&self, quantity: u64) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let stock_level = self.stock_level.checked_add(quantity).ok_or_else(|| {
            DomainError::invariant(format!("stock level overflow for {}", self.key))
        })?;
        Ok(Self {
            key: self.key,
            stock_level,
            version: self.version + 1,
        })
    }
}
