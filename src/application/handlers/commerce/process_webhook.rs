//! ProcessWebhookHandler - Command handler for inbound gateway webhooks.

use std::sync::Arc;

use crate::domain::commerce::{
    CommerceError, GatewayWebhookEvent, PaymentMethod, PaymentStatus, RawWebhookEnvelope,
    SettlementDetails, WebhookEventType, WebhookVerifier,
};
use crate::domain::foundation::{InvoiceId, SubscriptionId};
use crate::ports::{InvoiceLedger, PaymentRepository};

use super::grant_subscription::{GrantSubscriptionCommand, GrantSubscriptionHandler};

/// Command to process a gateway webhook.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub envelope: RawWebhookEnvelope,
}

/// Result of webhook processing.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// Payment succeeded; invoice paid and subscription granted.
    PaymentRecorded {
        invoice_id: InvoiceId,
        subscription_id: SubscriptionId,
        newly_granted: bool,
    },
    /// Payment failed; invoice marked FAILED.
    PaymentFailed { invoice_id: InvoiceId },
    /// Event acknowledged but no action taken (test event, out-of-order
    /// delivery against a terminal invoice).
    Acknowledged,
    /// Event type this system does not act on.
    Ignored,
}

/// Handler for processing gateway webhooks.
///
/// Delivery is at-least-once; every mutation on this path is guarded by a
/// natural idempotency key so redelivery of the same event is a no-op.
pub struct ProcessWebhookHandler {
    verifier: Arc<WebhookVerifier>,
    payments: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn InvoiceLedger>,
    grants: Arc<GrantSubscriptionHandler>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: Arc<WebhookVerifier>,
        payments: Arc<dyn PaymentRepository>,
        ledger: Arc<dyn InvoiceLedger>,
        grants: Arc<GrantSubscriptionHandler>,
    ) -> Self {
        Self {
            verifier,
            payments,
            ledger,
            grants,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, CommerceError> {
        let envelope = &cmd.envelope;

        // 1. Authenticate
        self.verifier
            .verify(
                envelope.signature.as_deref(),
                envelope.timestamp.as_deref(),
                &envelope.raw_body,
            )
            .map_err(|e| CommerceError::invalid_signature(e.to_string()))?;

        // 2. Normalize, falling back to the raw bytes once if needed
        let event = GatewayWebhookEvent::from_envelope(envelope).ok_or_else(|| {
            CommerceError::validation("body", "no parseable JSON body in webhook")
        })?;

        // 3. Short-circuit connectivity tests
        if event.is_test_event() {
            tracing::debug!("gateway test webhook acknowledged");
            return Ok(ProcessWebhookResult::Acknowledged);
        }

        // 4. Dispatch by event type
        match &event.event_type {
            WebhookEventType::PaymentSuccess => self.handle_payment_success(&event).await,
            WebhookEventType::PaymentFailed => self.handle_payment_failed(&event).await,
            WebhookEventType::Test => Ok(ProcessWebhookResult::Acknowledged),
            WebhookEventType::Unknown(event_type) => {
                tracing::info!(event_type, "ignoring unhandled webhook event type");
                Ok(ProcessWebhookResult::Ignored)
            }
        }
    }

    async fn handle_payment_success(
        &self,
        event: &GatewayWebhookEvent,
    ) -> Result<ProcessWebhookResult, CommerceError> {
        let (order_id, mut payment) = self.correlate(event).await?;

        let invoice = self
            .ledger
            .find_invoice(&payment.invoice_id)
            .await?
            .ok_or(CommerceError::InvoiceNotFound(payment.invoice_id))?;

        let payment_method = event
            .payment_method
            .as_ref()
            .map(|m| PaymentMethod::from_gateway_object(m).as_str().to_string());

        // Terminal guard: a redelivered success event must not re-append
        // financial records. A later attempt can still succeed after an
        // earlier one failed, so FAILED reopens; only PAID is final. The
        // grant below always runs; its own idempotency gate makes it a
        // no-op on replay.
        if !invoice.is_paid() {
            if invoice.status.is_terminal() {
                self.ledger.reopen(&invoice.id).await?;
            }
            self.ledger
                .mark_paid(
                    &invoice.id,
                    SettlementDetails {
                        payment_reference: Some(order_id.clone()),
                        transaction_id: event.gateway_payment_id.clone(),
                        payment_method: payment_method.clone(),
                        metadata: None,
                    },
                )
                .await?;
        }

        if payment.status != PaymentStatus::Success {
            payment.mark_success(event.gateway_payment_id.clone());
            self.payments.update(&payment).await?;
        }

        let grant = self
            .grants
            .handle(GrantSubscriptionCommand {
                user_id: invoice.customer_id,
                org_id: invoice.org_id,
                target: invoice.target,
                amount_paid_minor: invoice.total_minor,
                gateway_order_id: Some(order_id.clone()),
                transaction_id: event.gateway_payment_id.clone(),
                payment_method,
            })
            .await?;

        tracing::info!(
            order_id = %order_id,
            invoice_id = %invoice.id,
            subscription_id = %grant.subscription.id,
            newly_granted = grant.newly_granted,
            "payment success webhook processed"
        );

        Ok(ProcessWebhookResult::PaymentRecorded {
            invoice_id: invoice.id,
            subscription_id: grant.subscription.id,
            newly_granted: grant.newly_granted,
        })
    }

    async fn handle_payment_failed(
        &self,
        event: &GatewayWebhookEvent,
    ) -> Result<ProcessWebhookResult, CommerceError> {
        let (order_id, mut payment) = self.correlate(event).await?;

        let invoice = self
            .ledger
            .find_invoice(&payment.invoice_id)
            .await?
            .ok_or(CommerceError::InvoiceNotFound(payment.invoice_id))?;

        // Out-of-order delivery against an already settled invoice is
        // acknowledged, not replayed.
        if invoice.status.is_terminal() {
            tracing::info!(
                order_id = %order_id,
                invoice_status = invoice.status.as_str(),
                "failure webhook for terminal invoice, acknowledging"
            );
            return Ok(ProcessWebhookResult::Acknowledged);
        }

        let reason = event
            .failure_reason
            .clone()
            .unwrap_or_else(|| "payment failed at gateway".to_string());
        self.ledger.mark_failed(&invoice.id, &reason).await?;

        if !payment.status.is_terminal() {
            payment.mark_failed(Some(reason));
            self.payments.update(&payment).await?;
        }

        tracing::info!(order_id = %order_id, invoice_id = %invoice.id, "payment failure recorded");

        Ok(ProcessWebhookResult::PaymentFailed {
            invoice_id: invoice.id,
        })
    }

    /// Looks up the payment the event's order id correlates to.
    async fn correlate(
        &self,
        event: &GatewayWebhookEvent,
    ) -> Result<(String, crate::domain::commerce::Payment), CommerceError> {
        let order_id = event
            .order_id
            .clone()
            .ok_or_else(|| CommerceError::missing_order_correlation("<absent>"))?;
        let payment = self
            .payments
            .find_by_reference(&order_id)
            .await?
            .ok_or_else(|| CommerceError::missing_order_correlation(order_id.clone()))?;
        Ok((order_id, payment))
    }
}
