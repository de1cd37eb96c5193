use serde::{Deserialize, Serialize};

use storefront_catalog::{ProductId, StoreId};
use storefront_core::{DomainError, DomainResult};

/// One purchased product within a placement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u64,
    /// Unit price offered at checkout, in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Order placement request as handed over by the request-handling layer.
///
/// Carries the customer's contact details (used only if the customer does not
/// exist yet), the target store, and a non-empty list of purchased products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub store_id: StoreId,
    pub lines: Vec<LineRequest>,
}

impl PlaceOrderRequest {
    /// Shape validation, run before any side effect. Email syntax is checked
    /// later by the customer resolver; this guards the order shape itself.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("order must contain at least one line"));
        }
        for line in &self.lines {
            if line.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if line.unit_price == 0 {
                return Err(DomainError::validation("unit_price must be positive"));
            }
        }
        Ok(())
    }
}
