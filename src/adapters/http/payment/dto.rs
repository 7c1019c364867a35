//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::handlers::commerce::{
    GetPaymentHistoryResult, PaymentHistoryEntry, ResolveOrderResult, StartPurchaseResult,
};
use crate::domain::commerce::{
    GatewayOrderStatus, PurchaseScope, ResolvedOrderStatus, SubscriptionType, UserSubscription,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequestDto {
    /// The pricing plan to purchase.
    pub pricing_plan_id: String,
    /// Optional organization context.
    #[serde(default)]
    pub org_id: Option<String>,
    /// Currency override; falls back to the configured default.
    #[serde(default)]
    pub currency: Option<String>,
    /// Customer contact details forwarded to the gateway.
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// Request to resume an unfinished order.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeOrderRequestDto {
    pub order_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// Request to cancel an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderRequestDto {
    pub order_id: String,
    /// Optional human-readable cancel reason.
    #[serde(default)]
    pub reason: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response after starting a purchase: everything the client SDK needs to
/// open the gateway checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub payment_session_id: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub invoice_id: String,
}

impl From<StartPurchaseResult> for CreateOrderResponse {
    fn from(result: StartPurchaseResult) -> Self {
        Self {
            order_id: result.order_id,
            payment_session_id: result.gateway_session_token,
            amount_minor: result.amount_minor,
            currency: result.currency,
            invoice_id: result.invoice_id.to_string(),
        }
    }
}

/// Merged order status view.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStatusResponse {
    pub status: ResolvedOrderStatus,
    /// Live gateway status; null when the gateway was unreachable or does
    /// not know the order.
    pub gateway_status: Option<GatewayOrderStatus>,
    pub amount_minor: i64,
    pub currency: String,
    pub item_name: Option<String>,
}

impl From<ResolveOrderResult> for OrderStatusResponse {
    fn from(result: ResolveOrderResult) -> Self {
        Self {
            status: result.status,
            gateway_status: result.gateway_status,
            amount_minor: result.amount_minor,
            currency: result.currency,
            item_name: result.item_name,
        }
    }
}

/// Response after resuming an order.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeOrderResponse {
    /// One of `already_paid`, `reuse_session`, `new_order`.
    pub outcome: &'static str,
    pub order_id: Option<String>,
    pub payment_session_id: Option<String>,
}

/// Response after a cancel attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderResponse {
    pub cancelled: bool,
}

/// One entry in a customer's payment history.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistoryEntryResponse {
    pub invoice_id: String,
    pub item_name: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub invoice_status: String,
    pub order_id: Option<String>,
    pub payment_status: Option<String>,
    /// When the invoice was created (ISO 8601).
    pub created_at: String,
}

impl From<PaymentHistoryEntry> for PaymentHistoryEntryResponse {
    fn from(entry: PaymentHistoryEntry) -> Self {
        Self {
            invoice_id: entry.invoice_id.to_string(),
            item_name: entry.item_name,
            amount_minor: entry.amount_minor,
            currency: entry.currency,
            invoice_status: entry.invoice_status.as_str().to_string(),
            order_id: entry.order_id,
            payment_status: entry.payment_status,
            created_at: entry.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for payment history.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<PaymentHistoryEntryResponse>,
}

impl From<GetPaymentHistoryResult> for PaymentHistoryResponse {
    fn from(result: GetPaymentHistoryResult) -> Self {
        Self {
            payments: result
                .entries
                .into_iter()
                .map(PaymentHistoryEntryResponse::from)
                .collect(),
        }
    }
}

/// One active subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub scope: PurchaseScope,
    pub course_id: Option<String>,
    pub subject_ids: Vec<String>,
    pub subscription_type: SubscriptionType,
    /// End of the validity window (ISO 8601).
    pub end_date: String,
    pub auto_renew: bool,
}

impl From<UserSubscription> for SubscriptionResponse {
    fn from(sub: UserSubscription) -> Self {
        Self {
            id: sub.id.to_string(),
            scope: sub.scope,
            course_id: sub.course_id.map(|c| c.to_string()),
            subject_ids: sub.subject_ids.iter().map(|s| s.to_string()).collect(),
            subscription_type: sub.subscription_type,
            end_date: sub.end_date.as_datetime().to_rfc3339(),
            auto_renew: sub.auto_renew,
        }
    }
}

/// Response for active subscriptions.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionResponse>,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
