//! GetPaymentHistoryHandler - Query handler for a customer's purchase history.

use std::sync::Arc;

use crate::domain::commerce::{CommerceError, InvoiceStatus, Payment};
use crate::domain::foundation::{InvoiceId, Timestamp, UserId};
use crate::ports::{InvoiceLedger, PaymentRepository};

/// Command to fetch payment history.
#[derive(Debug, Clone)]
pub struct GetPaymentHistoryCommand {
    pub user_id: UserId,
}

/// One history entry: an invoice with its payment attempt, if any.
#[derive(Debug, Clone)]
pub struct PaymentHistoryEntry {
    pub invoice_id: InvoiceId,
    pub item_name: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub invoice_status: InvoiceStatus,
    pub order_id: Option<String>,
    pub payment_status: Option<String>,
    pub created_at: Timestamp,
}

/// Result of a history query.
#[derive(Debug, Clone)]
pub struct GetPaymentHistoryResult {
    pub entries: Vec<PaymentHistoryEntry>,
}

/// Handler for payment history queries.
pub struct GetPaymentHistoryHandler {
    ledger: Arc<dyn InvoiceLedger>,
    payments: Arc<dyn PaymentRepository>,
}

impl GetPaymentHistoryHandler {
    pub fn new(ledger: Arc<dyn InvoiceLedger>, payments: Arc<dyn PaymentRepository>) -> Self {
        Self { ledger, payments }
    }

    pub async fn handle(
        &self,
        cmd: GetPaymentHistoryCommand,
    ) -> Result<GetPaymentHistoryResult, CommerceError> {
        let invoices = self.ledger.list_for_customer(&cmd.user_id).await?;

        let mut entries = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            let payment: Option<Payment> = self.payments.find_by_invoice(&invoice.id).await?;
            entries.push(PaymentHistoryEntry {
                invoice_id: invoice.id,
                item_name: invoice.item_name().map(str::to_string),
                amount_minor: invoice.total_minor,
                currency: invoice.currency.clone(),
                invoice_status: invoice.status,
                order_id: payment.as_ref().map(|p| p.payment_reference.clone()),
                payment_status: payment.map(|p| p.status.as_str().to_string()),
                created_at: invoice.created_at,
            });
        }

        // Most recent first
        entries.sort_by(|a, b| b.created_at.as_datetime().cmp(&a.created_at.as_datetime()));

        Ok(GetPaymentHistoryResult { entries })
    }
}
