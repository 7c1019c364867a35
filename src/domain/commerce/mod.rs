//! Commerce domain module.
//!
//! Purchase orchestration, invoicing, payment lifecycle, webhook processing
//! and subscription granting.
//!
//! # Module Structure
//!
//! - `pricing` - PricingPlan and purchase scope/target value objects
//! - `invoice` - Invoice entity and line items
//! - `payment` - Payment entity, status and instrument normalization
//! - `subscription` - UserSubscription entity and grant semantics
//! - `order_status` - Gateway/local status precedence resolution
//! - `webhook` - Inbound webhook envelope and event normalization
//! - `webhook_verifier` - HMAC signature verification
//! - `errors` - Commerce error taxonomy

mod errors;
mod invoice;
mod order_status;
mod payment;
mod pricing;
mod subscription;
mod webhook;
mod webhook_verifier;

pub use errors::CommerceError;
pub use invoice::{Invoice, InvoiceStatus, LineItem, SettlementDetails};
pub use order_status::{resolve_order_status, GatewayOrderStatus, ResolvedOrderStatus};
pub use payment::{mint_payment_reference, Payment, PaymentMethod, PaymentStatus};
pub use pricing::{PricingPlan, PurchaseScope, PurchaseTarget};
pub use subscription::{
    SubscriptionStatus, SubscriptionType, UserSubscription, DEFAULT_VALIDITY_DAYS,
};
pub use webhook::{GatewayWebhookEvent, RawWebhookEnvelope, WebhookEventType};
pub use webhook_verifier::{SignatureError, WebhookVerifier};
