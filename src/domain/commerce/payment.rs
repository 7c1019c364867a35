//! Payment entity: one gateway-side order tied to an invoice.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{InvoiceId, PaymentId, Timestamp};

/// Lifecycle status of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Normalized payment instrument, derived from the gateway's nested
/// payment-method object in webhook payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Netbanking,
    Wallet,
    Other,
}

impl PaymentMethod {
    /// Normalizes the gateway's method object, which carries one key per
    /// instrument type (`{"card": {...}}`, `{"upi": {...}}`, ...).
    pub fn from_gateway_object(method: &serde_json::Value) -> Self {
        let Some(obj) = method.as_object() else {
            return PaymentMethod::Other;
        };
        if obj.contains_key("card") {
            PaymentMethod::Card
        } else if obj.contains_key("upi") {
            PaymentMethod::Upi
        } else if obj.contains_key("netbanking") {
            PaymentMethod::Netbanking
        } else if obj.contains_key("wallet") || obj.contains_key("app") {
            PaymentMethod::Wallet
        } else {
            PaymentMethod::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Netbanking => "netbanking",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Other => "other",
        }
    }
}

/// Mints a fresh gateway order id.
///
/// Used both at purchase start and when a resume supersedes a dead order.
pub fn mint_payment_reference() -> String {
    format!("order_{}", uuid::Uuid::new_v4().simple())
}

/// One gateway attempt against an invoice.
///
/// Created 1:1 with its invoice. On retry the record is reused: the
/// `payment_reference` is overwritten with the new gateway order id and the
/// status reset to PENDING, so at most one live gateway order maps to this
/// row at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    /// The gateway order id this system minted; unique among non-terminal
    /// payments and mutable on retry.
    pub payment_reference: String,
    /// The gateway's transaction id, known only after a payment completes.
    pub gateway_transaction_id: Option<String>,
    /// The gateway's checkout session token for the current order.
    pub gateway_session_token: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Points this record at a freshly minted gateway order, resetting it to
    /// PENDING. The previous order id becomes unresolvable through this
    /// system once superseded.
    pub fn supersede_with(&mut self, new_reference: String, session_token: Option<String>) {
        self.payment_reference = new_reference;
        self.gateway_session_token = session_token;
        self.gateway_transaction_id = None;
        self.failure_reason = None;
        self.status = PaymentStatus::Pending;
        self.updated_at = Timestamp::now();
    }

    /// Records a successful gateway payment.
    pub fn mark_success(&mut self, transaction_id: Option<String>) {
        self.gateway_transaction_id = transaction_id;
        self.status = PaymentStatus::Success;
        self.updated_at = Timestamp::now();
    }

    /// Records a failed gateway payment.
    pub fn mark_failed(&mut self, reason: Option<String>) {
        self.failure_reason = reason;
        self.status = PaymentStatus::Failed;
        self.updated_at = Timestamp::now();
    }

    /// Records a user-initiated cancellation.
    pub fn mark_cancelled(&mut self) {
        self.status = PaymentStatus::Cancelled;
        self.updated_at = Timestamp::now();
    }
}
