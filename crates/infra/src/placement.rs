//! Order placement workflow (application-level orchestration).
//!
//! `OrderPlacementService` drives one placement end to end:
//!
//! ```text
//! PlaceOrderRequest
//!   ↓
//! 1. Validate request shape (no side effects)
//!   ↓
//! 2. Store existence gate (fail fast, nothing mutated yet)
//!   ↓
//! 3. Products existence gate (read-only)
//!   ↓
//! 4. Resolve or create the customer (create-or-fetch, retried on conflict)
//!   ↓
//! 5. Reserve stock per line through the ledger (tracked in a guard)
//!   ↓
//! 6. Persist the order (header plus lines as one unit)
//!   ↓
//! 7. Commit the reservations and return the order id
//! ```
//!
//! The ledger and the order store are not transactionally unified, so
//! atomicity is compensation-based: reservations live in a
//! [`ReservationSet`](crate::ledger::ReservationSet) drop guard that releases
//! every granted decrement, in reverse order, on any exit before step 7:
//! a failed reservation mid-order, a failed order insert, a panic, or the
//! caller abandoning the call. No observer sees decremented stock without a
//! committed order outliving it.

use chrono::Utc;
use thiserror::Error;

use storefront_catalog::{ProductId, StoreId};
use storefront_core::{DomainError, EntityId};
use storefront_customers::{Customer, CustomerId, Email};
use storefront_inventory::InventoryKey;
use storefront_orders::{Order, OrderId, PlaceOrderRequest};

use crate::ledger::{InventoryLedger, LedgerError};
use crate::retry::RetryPolicy;
use crate::storage::{CustomerStore, InventoryStore, OrderStore, ProductCatalog, StorageError, StoreDirectory};

/// Placement failure, surfaced untranslated to the caller.
///
/// Every kind aborts the whole placement; partial reservations are always
/// compensated before the error is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("store not found: {0}")]
    StoreNotFound(StoreId),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u64,
    },

    /// Lost the customer-creation race repeatedly (transient, retryable).
    #[error("customer creation conflict: {0}")]
    DuplicateCustomerConflict(String),

    /// Reservation CAS retries exhausted under contention (transient, retryable).
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence failed; reservations were compensated (fatal for the request).
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl PlacementError {
    /// Transient kinds clear on their own; callers may re-run the placement.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCustomerConflict(_) | Self::TransactionConflict(_)
        )
    }
}

impl From<LedgerError> for PlacementError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::ProductNotFound(id) => Self::ProductNotFound(id),
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                requested,
                available,
            },
            LedgerError::Conflict(key) => {
                Self::TransactionConflict(format!("reservation conflict on {key}"))
            }
            LedgerError::InvalidQuantity => Self::Validation("quantity must be positive".to_string()),
            LedgerError::Storage(msg) => Self::PersistenceFailure(msg),
        }
    }
}

impl From<DomainError> for PlacementError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => Self::TransactionConflict(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// Transaction coordinator for order placement.
///
/// Generic over the storage seams so tests run against in-memory stores and
/// deployments can swap in real backends without touching this workflow.
#[derive(Debug)]
pub struct OrderPlacementService<C, D, P, S, O> {
    customers: C,
    stores: D,
    catalog: P,
    ledger: InventoryLedger<S>,
    orders: O,
    retry: RetryPolicy,
}

impl<C, D, P, S, O> OrderPlacementService<C, D, P, S, O> {
    pub fn new(customers: C, stores: D, catalog: P, inventory: S, orders: O) -> Self {
        Self::with_retry(customers, stores, catalog, inventory, orders, RetryPolicy::default())
    }

    pub fn with_retry(
        customers: C,
        stores: D,
        catalog: P,
        inventory: S,
        orders: O,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            customers,
            stores,
            catalog,
            ledger: InventoryLedger::with_retry(inventory, retry),
            orders,
            retry,
        }
    }

    pub fn ledger(&self) -> &InventoryLedger<S> {
        &self.ledger
    }
}

impl<C, D, P, S, O> OrderPlacementService<C, D, P, S, O>
where
    C: CustomerStore,
    D: StoreDirectory,
    P: ProductCatalog,
    S: InventoryStore,
    O: OrderStore,
{
    /// Place an order: all-or-nothing across customer resolution, stock
    /// reservation, and order persistence.
    pub fn place_order(&self, request: &PlaceOrderRequest) -> Result<OrderId, PlacementError> {
        // 1) Shape validation, before anything else.
        request.validate()?;

        // 2) Store gate. An invalid store must trigger no mutation at all.
        if !self.stores.exists(request.store_id) {
            return Err(PlacementError::StoreNotFound(request.store_id));
        }

        // 3) Unknown products fail before any reservation is attempted.
        for line in &request.lines {
            if self.catalog.get(line.product_id).is_none() {
                return Err(PlacementError::ProductNotFound(line.product_id));
            }
        }

        // 4) Customer is resolved before stock is touched; a failure here
        //    leaves nothing to compensate.
        let customer_id = self.resolve_customer(
            &request.customer_email,
            &request.customer_name,
            &request.customer_phone,
        )?;

        // 5) Reserve each line. The guard releases prior grants, in reverse
        //    order, on any exit before commit().
        let mut reservations = self.ledger.begin_reservations();
        for line in &request.lines {
            reservations.reserve(
                InventoryKey::new(line.product_id, request.store_id),
                line.quantity,
            )?;
        }

        // 6) Persist header and lines as one unit.
        let order = Order::place(
            OrderId::new(EntityId::new()),
            customer_id,
            request.store_id,
            &request.lines,
            Utc::now(),
        )?;
        let order_id = order.id_typed();
        let total = order.total();
        if let Err(e) = self.orders.insert(order) {
            tracing::warn!(%order_id, error = %e, "order persistence failed, compensating reservations");
            return Err(PlacementError::PersistenceFailure(e.to_string()));
        }

        // 7) Reservations are final once the order is committed.
        reservations.commit();
        tracing::debug!(%order_id, %customer_id, total, "order placed");
        Ok(order_id)
    }

    /// Idempotent get-or-create by email.
    ///
    /// A pre-check alone would be check-then-act; the race is settled by the
    /// store's unique-email insert. Losing that race means someone else just
    /// created the customer, so the next fetch wins. This is retried a bounded
    /// number of times before surfacing the (transient) conflict.
    pub fn resolve_customer(
        &self,
        email: &str,
        name: &str,
        phone: &str,
    ) -> Result<CustomerId, PlacementError> {
        let email = Email::parse(email)?;

        let mut last_conflict = String::new();
        for _ in 0..self.retry.customer_attempts {
            if let Some(existing) = self.customers.find_by_email(&email) {
                // Existing customers are reused unchanged; request
                // name/phone never overwrite stored values.
                return Ok(existing.id_typed());
            }

            let customer = Customer::new(
                CustomerId::new(EntityId::new()),
                name,
                email.clone(),
                phone,
                Utc::now(),
            )?;
            let id = customer.id_typed();
            match self.customers.insert(customer) {
                Ok(()) => return Ok(id),
                Err(StorageError::UniqueViolation(msg)) => {
                    last_conflict = msg;
                    continue;
                }
                Err(e) => return Err(PlacementError::PersistenceFailure(e.to_string())),
            }
        }

        Err(PlacementError::DuplicateCustomerConflict(last_conflict))
    }

    /// Advisory stock-sufficiency check for pre-checkout confirmation.
    ///
    /// Reads the latest committed level, but the answer may be stale by the
    /// time an order is placed; `place_order` re-validates atomically at
    /// reservation time.
    pub fn has_sufficient_stock(
        &self,
        product_id: ProductId,
        store_id: StoreId,
        quantity: u64,
    ) -> bool {
        self.ledger
            .available(InventoryKey::new(product_id, store_id))
            .is_some_and(|level| level >= quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_flagged() {
        assert!(PlacementError::DuplicateCustomerConflict("email".into()).is_transient());
        assert!(PlacementError::TransactionConflict("key".into()).is_transient());
        assert!(!PlacementError::PersistenceFailure("disk".into()).is_transient());
        assert!(!PlacementError::Validation("shape".into()).is_transient());
    }

    #[test]
    fn ledger_errors_map_to_placement_kinds() {
        let product_id = ProductId::new(EntityId::new());
        assert_eq!(
            PlacementError::from(LedgerError::ProductNotFound(product_id)),
            PlacementError::ProductNotFound(product_id)
        );
        assert!(matches!(
            PlacementError::from(LedgerError::InvalidQuantity),
            PlacementError::Validation(_)
        ));
        assert!(matches!(
            PlacementError::from(LedgerError::Storage("down".into())),
            PlacementError::PersistenceFailure(_)
        ));
    }
}
