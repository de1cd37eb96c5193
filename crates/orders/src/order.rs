use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{ProductId, StoreId};
use storefront_core::{DomainError, DomainResult, Entity, EntityId};
use storefront_customers::CustomerId;

use crate::request::LineRequest;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Order line: product, quantity, unit price captured at order time.
///
/// `line_total` is quantity x unit price, frozen here so later catalog price
/// changes never affect a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: u64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub line_total: u64,
}

/// Immutable order record: header plus owned lines.
///
/// `place` is the only constructor. Once built, an order never changes; it is
/// persisted as one unit or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    store_id: StoreId,
    /// Sum of line totals, in smallest currency unit.
    total: u64,
    placed_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Build an order from validated line requests.
    ///
    /// Rejects empty orders, zero quantities, and zero prices; totals use
    /// checked arithmetic so a malicious request cannot wrap them.
    pub fn place(
        id: OrderId,
        customer_id: CustomerId,
        store_id: StoreId,
        line_requests: &[LineRequest],
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if line_requests.is_empty() {
            return Err(DomainError::validation("order must contain at least one line"));
        }

        let mut lines = Vec::with_capacity(line_requests.len());
        let mut total: u64 = 0;
        for (idx, req) in line_requests.iter().enumerate() {
            if req.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if req.unit_price == 0 {
                return Err(DomainError::validation("unit_price must be positive"));
            }
            let line_total = req
                .quantity
                .checked_mul(req.unit_price)
                .ok_or_else(|| DomainError::validation("line total overflows"))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| DomainError::validation("order total overflows"))?;
            lines.push(OrderLine {
                line_no: (idx as u32) + 1,
                product_id: req.product_id,
                quantity: req.quantity,
                unit_price: req.unit_price,
                line_total,
            });
        }

        Ok(Self {
            id,
            customer_id,
            store_id,
            total,
            placed_at,
            lines,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
