//! Infrastructure layer: storage seams, the inventory ledger, and the order
//! placement workflow.

pub mod ledger;
pub mod placement;
pub mod retry;
pub mod storage;

#[cfg(test)]
mod integration_tests;
