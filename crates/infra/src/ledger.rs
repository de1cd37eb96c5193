//! Inventory ledger: serialized check-and-decrement per (product, store) key.
//!
//! Reservation is a load + compare-and-swap cycle against a versioned
//! [`InventoryStore`] record: load the record, check sufficiency, write the
//! decremented record at the loaded version. A concurrent writer moves the
//! version and the write is rejected, so the loop reloads and retries up to a
//! bound. Writers on one key are thereby linearized; distinct keys never
//! contend (a swap touches exactly one record).

use thiserror::Error;

use storefront_catalog::ProductId;
use storefront_core::ExpectedVersion;
use storefront_inventory::{InventoryKey, InventoryRecord};

use crate::retry::RetryPolicy;
use crate::storage::{InventoryStore, StorageError};

/// Ledger operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No inventory record exists for the (product, store) key.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough stock to cover the requested quantity.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    /// CAS retries exhausted under contention (transient).
    #[error("reservation conflict on {0}: retries exhausted")]
    Conflict(InventoryKey),

    /// Zero-quantity reserve/release request.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// The backing store failed outright.
    #[error("inventory storage failed: {0}")]
    Storage(String),
}

/// Atomic reserve/release/available over a versioned inventory store.
#[derive(Debug)]
pub struct InventoryLedger<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S> InventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self::with_retry(store, RetryPolicy::default())
    }

    pub fn with_retry(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }
}

impl<S> InventoryLedger<S>
where
    S: InventoryStore,
{
    /// Atomically decrement stock for `key` by `quantity` if sufficient.
    ///
    /// Fails with [`LedgerError::InsufficientStock`] without mutating state
    /// when stock does not cover the request, and with
    /// [`LedgerError::Conflict`] once the bounded CAS retries are exhausted.
    pub fn reserve(&self, key: InventoryKey, quantity: u64) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }

        for _ in 0..self.retry.reserve_attempts {
            let current = self
                .store
                .get(&key)
                .ok_or(LedgerError::ProductNotFound(key.product_id))?;

            if !current.has_sufficient_stock(quantity) {
                return Err(LedgerError::InsufficientStock {
                    product_id: key.product_id,
                    requested: quantity,
                    available: current.stock_level(),
                });
            }

            let expected = ExpectedVersion::Exact(current.version());
            let next = current
                .reserved(quantity)
                .map_err(|e| LedgerError::Storage(e.to_string()))?;

            match self.store.put(next, expected) {
                Ok(()) => return Ok(()),
                Err(StorageError::Concurrency(_)) => continue,
                Err(e) => return Err(LedgerError::Storage(e.to_string())),
            }
        }

        Err(LedgerError::Conflict(key))
    }

    /// Compensating increment: undo a prior reservation of `quantity` units.
    ///
    /// Uses a larger retry budget than `reserve`; giving up here would leak
    /// reserved stock, so exhaustion is logged before the conflict surfaces.
    pub fn release(&self, key: InventoryKey, quantity: u64) -> Result<(), LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }

        for _ in 0..self.retry.release_attempts {
            let current = self
                .store
                .get(&key)
                .ok_or(LedgerError::ProductNotFound(key.product_id))?;

            let expected = ExpectedVersion::Exact(current.version());
            let next = current
                .released(quantity)
                .map_err(|e| LedgerError::Storage(e.to_string()))?;

            match self.store.put(next, expected) {
                Ok(()) => return Ok(()),
                Err(StorageError::Concurrency(_)) => continue,
                Err(e) => return Err(LedgerError::Storage(e.to_string())),
            }
        }

        tracing::warn!(%key, quantity, "stock release exhausted its retries");
        Err(LedgerError::Conflict(key))
    }

    /// Latest committed stock level for `key` (no cache).
    pub fn available(&self, key: InventoryKey) -> Option<u64> {
        self.store.get(&key).map(|r| r.stock_level())
    }

    /// Start tracking reservations for one logical operation.
    ///
    /// The returned guard releases everything it granted, in reverse order,
    /// unless [`ReservationSet::commit`] is called. That covers rollback on a
    /// failed later step and release on caller abort alike.
    pub fn begin_reservations(&self) -> ReservationSet<'_, S> {
        ReservationSet {
            ledger: self,
            granted: Vec::new(),
            committed: false,
        }
    }
}

/// Reservations granted for one in-flight operation, auto-released on drop.
#[derive(Debug)]
pub struct ReservationSet<'a, S: InventoryStore> {
    ledger: &'a InventoryLedger<S>,
    granted: Vec<(InventoryKey, u64)>,
    committed: bool,
}

impl<S: InventoryStore> ReservationSet<'_, S> {
    /// Reserve through the owning ledger and record the grant for undo.
    pub fn reserve(&mut self, key: InventoryKey, quantity: u64) -> Result<(), LedgerError> {
        self.ledger.reserve(key, quantity)?;
        self.granted.push((key, quantity));
        Ok(())
    }

    pub fn granted_count(&self) -> usize {
        self.granted.len()
    }

    /// Make the reservations final; the guard will no longer release them.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl<S: InventoryStore> Drop for ReservationSet<'_, S> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (key, quantity) in self.granted.iter().rev() {
            if let Err(e) = self.ledger.release(*key, *quantity) {
                tracing::warn!(%key, quantity, error = %e, "failed to release reservation");
            }
        }
    }
}
