//! CancelOrderHandler - Command handler for cancelling an unfinished purchase.

use std::sync::Arc;

use crate::domain::commerce::{CommerceError, InvoiceStatus, PaymentStatus};
use crate::domain::foundation::UserId;
use crate::ports::{InvoiceLedger, PaymentRepository};

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: String,
    pub user_id: UserId,
    pub reason: Option<String>,
}

/// Result of a cancel attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOrderResult {
    /// The invoice is now CANCELLED.
    Cancelled,
    /// The order was already in a terminal failure state; cancel is a no-op.
    AlreadyTerminal,
}

/// Handler for cancelling orders.
pub struct CancelOrderHandler {
    payments: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn InvoiceLedger>,
}

impl CancelOrderHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>, ledger: Arc<dyn InvoiceLedger>) -> Self {
        Self { payments, ledger }
    }

    pub async fn handle(&self, cmd: CancelOrderCommand) -> Result<CancelOrderResult, CommerceError> {
        // 1. Load and authorize
        let mut payment = self
            .payments
            .find_by_reference(&cmd.order_id)
            .await?
            .ok_or_else(|| CommerceError::order_not_found(cmd.order_id.clone()))?;
        let invoice = self
            .ledger
            .find_invoice(&payment.invoice_id)
            .await?
            .ok_or(CommerceError::InvoiceNotFound(payment.invoice_id))?;
        if invoice.customer_id != cmd.user_id {
            return Err(CommerceError::Forbidden);
        }

        // 2. A completed payment cannot be cancelled
        if payment.status == PaymentStatus::Success || invoice.is_paid() {
            return Err(CommerceError::invalid_state(
                payment.status.as_str(),
                "cancel",
            ));
        }

        // 3. Idempotent no-op on already-terminal failure states
        if matches!(
            invoice.status,
            InvoiceStatus::Cancelled | InvoiceStatus::Failed
        ) {
            return Ok(CancelOrderResult::AlreadyTerminal);
        }

        // 4. Cancel
        let reason = cmd
            .reason
            .unwrap_or_else(|| "cancelled by user".to_string());
        self.ledger.mark_cancelled(&invoice.id, &reason).await?;
        payment.mark_cancelled();
        self.payments.update(&payment).await?;

        tracing::info!(order_id = %cmd.order_id, invoice_id = %invoice.id, "order cancelled");

        Ok(CancelOrderResult::Cancelled)
    }
}
