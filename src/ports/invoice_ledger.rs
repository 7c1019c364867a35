//! Invoice ledger port.
//!
//! Defines the contract for invoice persistence and terminal-state
//! transitions. The ledger owns the invariant that an invoice and its
//! PENDING payment are created atomically, and that no transition ever
//! leaves a terminal state.

use crate::domain::commerce::{Invoice, LineItem, Payment, PurchaseTarget, SettlementDetails};
use crate::domain::foundation::{DomainError, InvoiceId, OrgId, UserId};
use async_trait::async_trait;

/// Request to open an invoice with its initial payment.
#[derive(Debug, Clone)]
pub struct CreateInvoiceRequest {
    pub customer_id: UserId,
    pub org_id: Option<OrgId>,
    pub target: PurchaseTarget,
    pub line_items: Vec<LineItem>,
    pub currency: String,
    /// The gateway order id the orchestrator minted for the payment row.
    pub payment_reference: String,
}

/// An invoice together with its payment row, as created or loaded.
#[derive(Debug, Clone)]
pub struct InvoiceWithPayment {
    pub invoice: Invoice,
    pub payment: Payment,
}

/// Port for invoice persistence and lifecycle transitions.
///
/// Implementations must ensure:
/// - `create_invoice` writes the invoice and its PENDING payment atomically
/// - terminal-state transitions are guarded: a PAID, FAILED or CANCELLED
///   invoice is never transitioned again
#[async_trait]
pub trait InvoiceLedger: Send + Sync {
    /// Atomically create one PENDING invoice plus one PENDING payment.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceWithPayment, DomainError>;

    /// Transition an invoice to PAID, recording the settlement details on
    /// the invoice itself.
    ///
    /// No-op when the invoice is already PAID; rejects transitions out of
    /// other terminal states.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice doesn't exist
    /// - `InvalidStateTransition` if the invoice is FAILED or CANCELLED
    async fn mark_paid(
        &self,
        id: &InvoiceId,
        settlement: SettlementDetails,
    ) -> Result<Invoice, DomainError>;

    /// Reopen a FAILED or CANCELLED invoice back to PENDING for an explicit
    /// retry of the payment. PAID stays final.
    ///
    /// No-op when the invoice is already PENDING.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice doesn't exist
    /// - `InvalidStateTransition` if the invoice is PAID
    async fn reopen(&self, id: &InvoiceId) -> Result<Invoice, DomainError>;

    /// Transition an invoice to FAILED with a reason.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice doesn't exist
    /// - `InvalidStateTransition` if the invoice is already PAID or CANCELLED
    async fn mark_failed(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError>;

    /// Transition an invoice to CANCELLED with a reason.
    ///
    /// # Errors
    ///
    /// - `InvoiceNotFound` if the invoice doesn't exist
    /// - `InvalidStateTransition` if the invoice is already PAID
    async fn mark_cancelled(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError>;

    /// Find an invoice by id.
    ///
    /// Returns `None` if not found.
    async fn find_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// List a customer's invoices, most recent first.
    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError>;
}
