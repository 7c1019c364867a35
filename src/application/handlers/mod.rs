//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod commerce;

#[cfg(test)]
pub(crate) mod mocks;
