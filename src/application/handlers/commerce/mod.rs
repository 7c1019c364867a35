//! Commerce handlers.
//!
//! Command and query handlers for the purchase lifecycle:
//!
//! ## Commands
//! - Starting a purchase (invoice + gateway order)
//! - Processing gateway webhooks
//! - Granting subscriptions
//! - Resuming and cancelling orders
//!
//! ## Queries
//! - Resolving an order's merged status
//! - Payment history
//! - Active subscriptions

mod cancel_order;
mod grant_subscription;
mod list_subscriptions;
mod payment_history;
mod process_webhook;
mod resolve_order;
mod resume_order;
mod start_purchase;

// Commands
pub use cancel_order::{CancelOrderCommand, CancelOrderHandler, CancelOrderResult};
pub use grant_subscription::{
    GrantSubscriptionCommand, GrantSubscriptionHandler, GrantSubscriptionResult,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use resume_order::{ResumeOrderCommand, ResumeOrderHandler, ResumeOrderResult};
pub use start_purchase::{StartPurchaseCommand, StartPurchaseHandler, StartPurchaseResult};

// Queries
pub use list_subscriptions::{
    ListSubscriptionsCommand, ListSubscriptionsHandler, ListSubscriptionsResult,
};
pub use payment_history::{
    GetPaymentHistoryCommand, GetPaymentHistoryHandler, GetPaymentHistoryResult,
    PaymentHistoryEntry,
};
pub use resolve_order::{ResolveOrderCommand, ResolveOrderHandler, ResolveOrderResult};
