//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresInvoiceLedger` - Invoices with their payment rows, created atomically
//! - `PostgresPaymentRepository` - Payment lookup and mutation by gateway reference
//! - `PostgresSubscriptionRepository` - Granted subscriptions and idempotency lookups
//! - `PostgresCatalogReader` - Read-only pricing plan and course/subject lookups

mod catalog_reader;
mod invoice_ledger;
mod payment_repository;
mod rows;
mod subscription_repository;

pub use catalog_reader::PostgresCatalogReader;
pub use invoice_ledger::PostgresInvoiceLedger;
pub use payment_repository::PostgresPaymentRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
