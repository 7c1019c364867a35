//! Invoice entity: the billable record of one purchase attempt.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{InvoiceId, OrgId, Timestamp, UserId};

use super::pricing::PurchaseTarget;

/// Lifecycle status of an invoice.
///
/// PENDING may move to exactly one of the terminal states (PAID, FAILED,
/// CANCELLED); no transition ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl InvoiceStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Failed | InvoiceStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Failed => "FAILED",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A single billed line on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount_minor: i64,
}

/// Gateway settlement annotation recorded on the invoice when it is marked
/// PAID: which order reference settled it, with what transaction, and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementDetails {
    pub payment_reference: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// The billable record of one purchase attempt, pre-payment through terminal
/// state. Created by the Invoice Ledger together with one PENDING payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: UserId,
    pub org_id: Option<OrgId>,
    pub target: PurchaseTarget,
    pub total_minor: i64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub line_items: Vec<LineItem>,
    /// Terminal-state annotation: failure or cancellation reason.
    pub status_reason: Option<String>,
    /// Present once the invoice is PAID.
    pub settlement: Option<SettlementDetails>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    /// Returns the description of the first line item, used as the
    /// user-facing item name in order resolution and history.
    pub fn item_name(&self) -> Option<&str> {
        self.line_items.first().map(|li| li.description.as_str())
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}
