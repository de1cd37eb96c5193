//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects with **no identity**. They are defined
//! entirely by their attribute values and are immutable once constructed;
//! "modifying" one means building a new value.

/// Marker trait for value objects.
///
/// Contrast with [`crate::Entity`]: two entities with the same id are the same
/// entity; two value objects with the same values are equal.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
