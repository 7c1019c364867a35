//! Order status resolution: merging live gateway state with local state.

use serde::{Deserialize, Serialize};

use super::invoice::InvoiceStatus;
use super::payment::PaymentStatus;

/// Live order status as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayOrderStatus {
    /// Checkout session is open and can still be completed.
    Active,
    Paid,
    Expired,
    Failed,
    /// The user abandoned the checkout; treated as terminal failure so a
    /// retry is possible immediately instead of waiting for expiry.
    UserDropped,
    #[serde(untagged)]
    Unknown(String),
}

impl GatewayOrderStatus {
    pub fn from_gateway_str(s: &str) -> Self {
        match s {
            "ACTIVE" => GatewayOrderStatus::Active,
            "PAID" => GatewayOrderStatus::Paid,
            "EXPIRED" => GatewayOrderStatus::Expired,
            "FAILED" => GatewayOrderStatus::Failed,
            "USER_DROPPED" => GatewayOrderStatus::UserDropped,
            other => GatewayOrderStatus::Unknown(other.to_string()),
        }
    }
}

/// Merged, caller-facing status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedOrderStatus {
    Success,
    Failed,
    Pending,
}

/// Merges gateway and local knowledge into one answer, first match wins.
///
/// The gateway is the authoritative real-time source; when it is unreachable
/// (`gateway` is `None`) local state, itself updated by the webhook path, is
/// the fallback authority.
///
/// Precedence:
/// 1. gateway PAID -> SUCCESS
/// 2. gateway FAILED / USER_DROPPED / EXPIRED -> FAILED
/// 3. local payment SUCCESS -> SUCCESS
/// 4. local payment FAILED -> FAILED
/// 5. local invoice PAID -> SUCCESS
/// 6. local invoice CANCELLED / FAILED -> FAILED
/// 7. otherwise PENDING
pub fn resolve_order_status(
    gateway: Option<&GatewayOrderStatus>,
    payment: PaymentStatus,
    invoice: InvoiceStatus,
) -> ResolvedOrderStatus {
    match gateway {
        Some(GatewayOrderStatus::Paid) => return ResolvedOrderStatus::Success,
        Some(GatewayOrderStatus::Failed)
        | Some(GatewayOrderStatus::UserDropped)
        | Some(GatewayOrderStatus::Expired) => return ResolvedOrderStatus::Failed,
        _ => {}
    }

    match payment {
        PaymentStatus::Success => return ResolvedOrderStatus::Success,
        PaymentStatus::Failed => return ResolvedOrderStatus::Failed,
        _ => {}
    }

    match invoice {
        InvoiceStatus::Paid => ResolvedOrderStatus::Success,
        InvoiceStatus::Cancelled | InvoiceStatus::Failed => ResolvedOrderStatus::Failed,
        _ => ResolvedOrderStatus::Pending,
    }
}
