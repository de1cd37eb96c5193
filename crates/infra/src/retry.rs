//! Retry bounds for transient conflicts.

/// Bounded retry counts for optimistic-concurrency conflicts.
///
/// Reservation attempts retry a handful of times before surfacing a
/// transaction conflict. Compensating releases get a larger budget: giving
/// up on a release would leak reserved stock, so the ledger tries much
/// harder (and logs loudly) before surfacing that conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// CAS attempts per `reserve` call.
    pub reserve_attempts: u32,
    /// CAS attempts per `release` call.
    pub release_attempts: u32,
    /// Create-or-fetch rounds when resolving a customer by email.
    pub customer_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reserve_attempts: 8,
            release_attempts: 64,
            customer_attempts: 4,
        }
    }
}
