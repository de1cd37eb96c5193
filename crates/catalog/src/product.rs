use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, EntityId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog product.
///
/// The placement core only ever reads `id` and `unit_price`; catalog
/// maintenance (create/update/search) lives in the surrounding CRUD layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    /// Current catalog price in smallest currency unit (e.g., cents).
    unit_price: u64,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: u64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            unit_price,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product_id() -> ProductId {
        ProductId::new(EntityId::new())
    }

    #[test]
    fn new_product_carries_price() {
        let product = Product::new(test_product_id(), "Widget", 1000).unwrap();
        assert_eq!(product.unit_price(), 1000);
        assert_eq!(product.name(), "Widget");
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Product::new(test_product_id(), "   ", 1000).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
