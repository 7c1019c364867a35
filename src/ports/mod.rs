//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Gateway Ports
//!
//! - `GatewayClient` - Order creation and status polling at the payment gateway
//!
//! ## Persistence Ports
//!
//! - `InvoiceLedger` - Invoice lifecycle with atomic invoice+payment creation
//! - `PaymentRepository` - Payment rows keyed by gateway order reference
//! - `SubscriptionRepository` - Granted subscriptions with idempotency lookup
//!
//! ## Read Ports
//!
//! - `CatalogReader` - Read-only pricing and course composition

mod catalog;
mod gateway_client;
mod invoice_ledger;
mod payment_repository;
mod subscription_repository;

pub use catalog::CatalogReader;
pub use gateway_client::{
    CreateOrderRequest, CustomerDetails, GatewayClient, GatewayError, GatewayErrorCode,
    GatewayOrder, GatewayOrderSnapshot,
};
pub use invoice_ledger::{CreateInvoiceRequest, InvoiceLedger, InvoiceWithPayment};
pub use payment_repository::PaymentRepository;
pub use subscription_repository::SubscriptionRepository;
