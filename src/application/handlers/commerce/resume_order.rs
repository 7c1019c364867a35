//! ResumeOrderHandler - Command handler for resuming an unfinished purchase.

use std::sync::Arc;

use crate::domain::commerce::{
    mint_payment_reference, CommerceError, GatewayOrderStatus, PaymentStatus, SettlementDetails,
};
use crate::domain::foundation::UserId;
use crate::ports::{
    CreateOrderRequest, CustomerDetails, GatewayClient, GatewayOrderSnapshot, InvoiceLedger,
    PaymentRepository,
};

use super::grant_subscription::{GrantSubscriptionCommand, GrantSubscriptionHandler};

/// Command to resume an order.
#[derive(Debug, Clone)]
pub struct ResumeOrderCommand {
    pub order_id: String,
    pub user_id: UserId,
    pub customer: CustomerDetails,
}

/// Result of a resume attempt.
#[derive(Debug, Clone)]
pub enum ResumeOrderResult {
    /// The order is already settled; nothing to resume.
    AlreadyPaid,
    /// The existing checkout session is still open and can be reused.
    ReuseSession {
        order_id: String,
        gateway_session_token: Option<String>,
    },
    /// A fresh gateway order now supersedes the dead one.
    NewOrder {
        order_id: String,
        gateway_session_token: Option<String>,
    },
}

/// Handler for resuming orders.
///
/// Prefers reusing a still-open checkout session; only mints a replacement
/// gateway order when the previous one is dead. A replacement overwrites the
/// payment's reference, making the superseded order id unresolvable here.
pub struct ResumeOrderHandler {
    payments: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn InvoiceLedger>,
    gateway: Arc<dyn GatewayClient>,
    grants: Arc<GrantSubscriptionHandler>,
}

impl ResumeOrderHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        ledger: Arc<dyn InvoiceLedger>,
        gateway: Arc<dyn GatewayClient>,
        grants: Arc<GrantSubscriptionHandler>,
    ) -> Self {
        Self {
            payments,
            ledger,
            gateway,
            grants,
        }
    }

    pub async fn handle(&self, cmd: ResumeOrderCommand) -> Result<ResumeOrderResult, CommerceError> {
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

        // 2. Locally settled already
        if payment.status == PaymentStatus::Success {
            return Ok(ResumeOrderResult::AlreadyPaid);
        }

        // 3. Consult the gateway; an unreachable gateway degrades to the
        //    remint path, which then surfaces its own failure if any.
        let snapshot = match self.gateway.get_order_status(&cmd.order_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(order_id = %cmd.order_id, error = %e, "gateway poll failed during resume");
                None
            }
        };

        if let Some(snapshot) = &snapshot {
            match snapshot.order_status {
                // Lost webhook: the gateway settled this order but we never
                // heard. Heal local state and grant before reporting paid.
                GatewayOrderStatus::Paid => {
                    self.heal_paid_order(&cmd, &mut payment, &invoice, snapshot)
                        .await?;
                    return Ok(ResumeOrderResult::AlreadyPaid);
                }
                GatewayOrderStatus::Active => {
                    if snapshot.session_token.is_some() {
                        return Ok(ResumeOrderResult::ReuseSession {
                            order_id: cmd.order_id.clone(),
                            gateway_session_token: snapshot.session_token.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        // 4. The old order is dead; mint a replacement
        let new_reference = mint_payment_reference();
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                order_id: new_reference.clone(),
                amount_minor: payment.amount_minor,
                currency: payment.currency.clone(),
                customer_id: cmd.user_id,
                customer_details: cmd.customer,
                metadata: Some(serde_json::json!({
                    "invoice_id": invoice.id.to_string(),
                    "supersedes": cmd.order_id,
                })),
            })
            .await
            .map_err(|e| CommerceError::gateway_unavailable(e.to_string()))?;

        // An explicit retry reopens an invoice a failure webhook (or a
        // cancellation) closed; only PAID stays final.
        if invoice.status.is_terminal() && !invoice.is_paid() {
            self.ledger.reopen(&invoice.id).await?;
        }

        payment.supersede_with(new_reference.clone(), order.session_token.clone());
        self.payments.update(&payment).await?;

        tracing::info!(
            old_order_id = %cmd.order_id,
            order_id = %new_reference,
            invoice_id = %invoice.id,
            "order superseded on resume"
        );

        Ok(ResumeOrderResult::NewOrder {
            order_id: new_reference,
            gateway_session_token: order.session_token,
        })
    }

    async fn heal_paid_order(
        &self,
        cmd: &ResumeOrderCommand,
        payment: &mut crate::domain::commerce::Payment,
        invoice: &crate::domain::commerce::Invoice,
        snapshot: &GatewayOrderSnapshot,
    ) -> Result<(), CommerceError> {
        tracing::info!(
            order_id = %cmd.order_id,
            invoice_id = %invoice.id,
            "gateway reports paid but local state is stale, self-healing"
        );

        if !invoice.is_paid() {
            if invoice.status.is_terminal() {
                self.ledger.reopen(&invoice.id).await?;
            }
            self.ledger
                .mark_paid(
                    &invoice.id,
                    SettlementDetails {
                        payment_reference: Some(cmd.order_id.clone()),
                        transaction_id: snapshot.transaction_id.clone(),
                        payment_method: None,
                        metadata: None,
                    },
                )
                .await?;
        }
        payment.mark_success(snapshot.transaction_id.clone());
        self.payments.update(payment).await?;

        self.grants
            .handle(GrantSubscriptionCommand {
                user_id: invoice.customer_id,
                org_id: invoice.org_id,
                target: invoice.target,
                amount_paid_minor: invoice.total_minor,
                gateway_order_id: Some(cmd.order_id.clone()),
                transaction_id: snapshot.transaction_id.clone(),
                payment_method: None,
            })
            .await?;
        Ok(())
    }
}
