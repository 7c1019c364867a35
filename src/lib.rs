//! Coursepay - Education Platform Commerce Layer
//!
//! Turns a pricing selection (course or subject) into a paid subscription by
//! coordinating a local ledger (invoices, payments) with an external,
//! asynchronous payment gateway.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
