//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `commerce` - Purchase, invoice, payment and subscription lifecycle

pub mod commerce;
pub mod foundation;
