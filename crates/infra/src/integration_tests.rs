//! Integration tests for the full placement workflow.
//!
//! Tests: request → store/product gates → customer resolution → ledger
//! reservation → order persistence, against the in-memory stores.
//!
//! Verifies:
//! - Successful placements capture totals and decrement stock
//! - Every failure path compensates reservations (no partial state)
//! - Concurrent placements never oversell; concurrent resolution never
//!   duplicates a customer

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier};

use storefront_catalog::{Product, ProductId, Store, StoreId};
use storefront_core::{EntityId, ExpectedVersion};
use storefront_customers::Email;
use storefront_inventory::{InventoryKey, InventoryRecord};
use storefront_orders::{LineRequest, Order, PlaceOrderRequest};

use crate::placement::{OrderPlacementService, PlacementError};
use crate::retry::RetryPolicy;
use crate::storage::{
    CustomerStore, InMemoryCustomerStore, InMemoryInventoryStore, InMemoryOrderStore,
    InMemoryProductCatalog, InMemoryStoreDirectory, InventoryStore, OrderStore, StorageError,
};

type InMemoryPlacementService<S = Arc<InMemoryInventoryStore>, O = Arc<InMemoryOrderStore>> =
    OrderPlacementService<
        Arc<InMemoryCustomerStore>,
        Arc<InMemoryStoreDirectory>,
        Arc<InMemoryProductCatalog>,
        S,
        O,
    >;

struct Fixture {
    customers: Arc<InMemoryCustomerStore>,
    catalog: Arc<InMemoryProductCatalog>,
    inventory: Arc<InMemoryInventoryStore>,
    orders: Arc<InMemoryOrderStore>,
    service: Arc<InMemoryPlacementService>,
    store_id: StoreId,
}

fn fixture() -> Fixture {
    storefront_observability::init();

    let customers = Arc::new(InMemoryCustomerStore::new());
    let stores = Arc::new(InMemoryStoreDirectory::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let inventory = Arc::new(InMemoryInventoryStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());

    let store_id = StoreId::new(EntityId::new());
    stores.insert(Store::new(store_id, "Downtown").unwrap());

    let service = Arc::new(OrderPlacementService::new(
        customers.clone(),
        stores,
        catalog.clone(),
        inventory.clone(),
        orders.clone(),
    ));

    Fixture {
        customers,
        catalog,
        inventory,
        orders,
        service,
        store_id,
    }
}

impl Fixture {
    /// Register a product and seed its stock at the fixture's store.
    fn seed_product(&self, name: &str, unit_price: u64, stock: u64) -> ProductId {
        let product_id = ProductId::new(EntityId::new());
        self.catalog
            .insert(Product::new(product_id, name, unit_price).unwrap());
        self.inventory
            .put(
                InventoryRecord::new(InventoryKey::new(product_id, self.store_id), stock),
                ExpectedVersion::Any,
            )
            .unwrap();
        product_id
    }

    fn stock(&self, product_id: ProductId) -> Option<u64> {
        self.inventory
            .get(&InventoryKey::new(product_id, self.store_id))
            .map(|r| r.stock_level())
    }
}

fn request(store_id: StoreId, lines: Vec<LineRequest>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_name: "Jane Doe".to_string(),
        customer_email: "jane@example.com".to_string(),
        customer_phone: "555-0100".to_string(),
        store_id,
        lines,
    }
}

fn line(product_id: ProductId, quantity: u64, unit_price: u64) -> LineRequest {
    LineRequest {
        product_id,
        quantity,
        unit_price,
    }
}

/// Order store that rejects every insert; used to exercise compensation.
#[derive(Debug, Default)]
struct FailingOrderStore;

impl OrderStore for FailingOrderStore {
    fn insert(&self, _order: Order) -> Result<(), StorageError> {
        Err(StorageError::Backend("injected insert failure".to_string()))
    }

    fn get(&self, _id: storefront_orders::OrderId) -> Option<Order> {
        None
    }
}

/// Inventory store that fails the next N writes with a concurrency error,
/// simulating contention from another writer.
#[derive(Debug)]
struct FlakyInventoryStore {
    inner: Arc<InMemoryInventoryStore>,
    failures_left: AtomicU32,
}

impl FlakyInventoryStore {
    fn new(inner: Arc<InMemoryInventoryStore>, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
        }
    }
}

impl InventoryStore for FlakyInventoryStore {
    fn get(&self, key: &InventoryKey) -> Option<InventoryRecord> {
        self.inner.get(key)
    }

    fn put(&self, record: InventoryRecord, expected: ExpectedVersion) -> Result<(), StorageError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StorageError::Concurrency(
                "injected version conflict".to_string(),
            ));
        }
        self.inner.put(record, expected)
    }
}

#[test]
fn successful_placement_captures_totals_and_decrements_stock() {
    let fx = fixture();
    // 3 x 10.00 + 1 x 5.00 (prices in cents)
    let widget = fx.seed_product("Widget", 1000, 10);
    let gadget = fx.seed_product("Gadget", 500, 4);

    let order_id = fx
        .service
        .place_order(&request(
            fx.store_id,
            vec![line(widget, 3, 1000), line(gadget, 1, 500)],
        ))
        .unwrap();

    let order = fx.orders.get(order_id).unwrap();
    assert_eq!(order.total(), 3500);
    assert_eq!(order.store_id(), fx.store_id);
    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.lines()[0].line_total, 3000);
    assert_eq!(order.lines()[1].line_total, 500);

    assert_eq!(fx.stock(widget), Some(7));
    assert_eq!(fx.stock(gadget), Some(3));

    // The order references the resolved customer.
    let email = Email::parse("jane@example.com").unwrap();
    let customer = fx.customers.find_by_email(&email).unwrap();
    assert_eq!(order.customer_id(), customer.id_typed());
    assert_eq!(customer.name(), "Jane Doe");
}

#[test]
fn existing_customer_is_reused_unchanged() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);

    let first = fx
        .service
        .place_order(&request(fx.store_id, vec![line(widget, 1, 1000)]))
        .unwrap();

    // Same email, different name/phone: the stored record must win.
    let mut second_request = request(fx.store_id, vec![line(widget, 1, 1000)]);
    second_request.customer_name = "J. Doe".to_string();
    second_request.customer_phone = "555-0199".to_string();
    let second = fx.service.place_order(&second_request).unwrap();

    let first_order = fx.orders.get(first).unwrap();
    let second_order = fx.orders.get(second).unwrap();
    assert_eq!(first_order.customer_id(), second_order.customer_id());

    let email = Email::parse("jane@example.com").unwrap();
    let customer = fx.customers.find_by_email(&email).unwrap();
    assert_eq!(customer.name(), "Jane Doe");
    assert_eq!(customer.phone(), "555-0100");
}

#[test]
fn unknown_store_fails_fast_with_no_side_effects() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);
    let bogus_store = StoreId::new(EntityId::new());

    let err = fx
        .service
        .place_order(&request(bogus_store, vec![line(widget, 1, 1000)]))
        .unwrap_err();

    assert_eq!(err, PlacementError::StoreNotFound(bogus_store));
    assert_eq!(fx.stock(widget), Some(10));
    // Not even the customer is created.
    let email = Email::parse("jane@example.com").unwrap();
    assert!(fx.customers.find_by_email(&email).is_none());
    assert!(fx.orders.is_empty());
}

#[test]
fn unknown_product_fails_before_any_reservation() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);
    let bogus_product = ProductId::new(EntityId::new());

    let err = fx
        .service
        .place_order(&request(
            fx.store_id,
            vec![line(widget, 2, 1000), line(bogus_product, 1, 500)],
        ))
        .unwrap_err();

    assert_eq!(err, PlacementError::ProductNotFound(bogus_product));
    assert_eq!(fx.stock(widget), Some(10));
    assert!(fx.orders.is_empty());
}

#[test]
fn product_without_inventory_record_is_product_not_found() {
    let fx = fixture();
    // In the catalog, but never stocked at this store.
    let unstocked = ProductId::new(EntityId::new());
    fx.catalog
        .insert(Product::new(unstocked, "Unstocked", 700).unwrap());

    let err = fx
        .service
        .place_order(&request(fx.store_id, vec![line(unstocked, 1, 700)]))
        .unwrap_err();

    assert_eq!(err, PlacementError::ProductNotFound(unstocked));
    assert!(fx.orders.is_empty());
}

#[test]
fn failed_line_restores_all_prior_reservations() {
    let fx = fixture();
    // Stock {A:5, B:0}; order {A:2, B:1} → overall failure; post {A:5, B:0}.
    let a = fx.seed_product("A", 1000, 5);
    let b = fx.seed_product("B", 500, 0);

    let err = fx
        .service
        .place_order(&request(fx.store_id, vec![line(a, 2, 1000), line(b, 1, 500)]))
        .unwrap_err();

    assert_eq!(
        err,
        PlacementError::InsufficientStock {
            product_id: b,
            requested: 1,
            available: 0,
        }
    );
    assert_eq!(fx.stock(a), Some(5));
    assert_eq!(fx.stock(b), Some(0));
    assert!(fx.orders.is_empty());
}

#[test]
fn two_concurrent_placements_for_one_unit_yield_one_order() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 1);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["jane@example.com", "john@example.com"]
        .into_iter()
        .map(|email| {
            let service = fx.service.clone();
            let barrier = barrier.clone();
            let store_id = fx.store_id;
            let email = email.to_string();
            std::thread::spawn(move || {
                let mut req = request(store_id, vec![line(widget, 1, 1000)]);
                req.customer_email = email;
                barrier.wait();
                service.place_order(&req)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(PlacementError::InsufficientStock { available: 0, .. })
    )));
    assert_eq!(fx.stock(widget), Some(0));
    assert_eq!(fx.orders.len(), 1);
}

#[test]
fn concurrent_resolution_of_a_new_email_creates_one_customer() {
    let fx = fixture();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let service = fx.service.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                service.resolve_customer("fresh@example.com", "Jane Doe", "555-0100")
            })
        })
        .collect();

    let ids: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    // Every call returned the same, single record.
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    let email = Email::parse("fresh@example.com").unwrap();
    assert_eq!(fx.customers.find_by_email(&email).unwrap().id_typed(), ids[0]);
}

#[test]
fn persistence_failure_compensates_all_reservations() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);
    let gadget = fx.seed_product("Gadget", 500, 4);

    // Same seams, but the order store rejects every insert.
    let service: InMemoryPlacementService<Arc<InMemoryInventoryStore>, FailingOrderStore> =
        OrderPlacementService::new(
            fx.customers.clone(),
            {
                let stores = Arc::new(InMemoryStoreDirectory::new());
                stores.insert(Store::new(fx.store_id, "Downtown").unwrap());
                stores
            },
            fx.catalog.clone(),
            fx.inventory.clone(),
            FailingOrderStore,
        );

    let err = service
        .place_order(&request(
            fx.store_id,
            vec![line(widget, 3, 1000), line(gadget, 1, 500)],
        ))
        .unwrap_err();

    assert!(matches!(err, PlacementError::PersistenceFailure(_)));
    assert_eq!(fx.stock(widget), Some(10));
    assert_eq!(fx.stock(gadget), Some(4));
}

#[test]
fn transient_conflict_clears_on_rerun_without_double_decrement() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);

    let flaky = FlakyInventoryStore::new(fx.inventory.clone(), 1);
    let service: InMemoryPlacementService<FlakyInventoryStore> =
        OrderPlacementService::with_retry(
            fx.customers.clone(),
            {
                let stores = Arc::new(InMemoryStoreDirectory::new());
                stores.insert(Store::new(fx.store_id, "Downtown").unwrap());
                stores
            },
            fx.catalog.clone(),
            flaky,
            fx.orders.clone(),
            RetryPolicy {
                reserve_attempts: 1,
                ..RetryPolicy::default()
            },
        );

    let req = request(fx.store_id, vec![line(widget, 2, 1000)]);
    let err = service.place_order(&req).unwrap_err();
    assert!(matches!(err, PlacementError::TransactionConflict(_)));
    assert!(err.is_transient());
    assert_eq!(fx.stock(widget), Some(10));

    // The conflict has cleared; the rerun decrements exactly once.
    service.place_order(&req).unwrap();
    assert_eq!(fx.stock(widget), Some(8));
    assert_eq!(fx.orders.len(), 1);
}

#[test]
fn has_sufficient_stock_tracks_the_committed_level() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 5);

    assert!(fx.service.has_sufficient_stock(widget, fx.store_id, 5));
    assert!(!fx.service.has_sufficient_stock(widget, fx.store_id, 100));

    let restocked = fx.seed_product("Restocked", 1000, 100);
    assert!(fx.service.has_sufficient_stock(restocked, fx.store_id, 100));

    // Unknown (product, store) pairs report no stock.
    let bogus = ProductId::new(EntityId::new());
    assert!(!fx.service.has_sufficient_stock(bogus, fx.store_id, 1));
}

#[test]
fn placement_request_round_trips_from_wire_json() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);

    // What the (out-of-scope) HTTP layer would hand over.
    let payload = serde_json::json!({
        "customer_name": "Jane Doe",
        "customer_email": "jane@example.com",
        "customer_phone": "555-0100",
        "store_id": fx.store_id,
        "lines": [
            { "product_id": widget, "quantity": 3, "unit_price": 1000 }
        ]
    });

    let req: PlaceOrderRequest = serde_json::from_value(payload).unwrap();
    let order_id = fx.service.place_order(&req).unwrap();
    assert_eq!(fx.orders.get(order_id).unwrap().total(), 3000);
}

#[test]
fn malformed_email_is_a_validation_error_before_any_mutation() {
    let fx = fixture();
    let widget = fx.seed_product("Widget", 1000, 10);

    let mut req = request(fx.store_id, vec![line(widget, 1, 1000)]);
    req.customer_email = "not-an-email".to_string();

    let err = fx.service.place_order(&req).unwrap_err();
    assert!(matches!(err, PlacementError::Validation(_)));
    assert_eq!(fx.stock(widget), Some(10));
    assert!(fx.orders.is_empty());
}
