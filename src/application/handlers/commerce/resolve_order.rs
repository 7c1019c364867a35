//! ResolveOrderHandler - Query handler for on-demand order status resolution.

use std::sync::Arc;

use crate::domain::commerce::{
    resolve_order_status, CommerceError, GatewayOrderStatus, ResolvedOrderStatus,
};
use crate::ports::{GatewayClient, InvoiceLedger, PaymentRepository};

/// Command to resolve an order's current status.
#[derive(Debug, Clone)]
pub struct ResolveOrderCommand {
    pub order_id: String,
}

/// Merged view of an order.
#[derive(Debug, Clone)]
pub struct ResolveOrderResult {
    pub status: ResolvedOrderStatus,
    /// Live gateway status; `None` when the gateway was unreachable or does
    /// not know the order.
    pub gateway_status: Option<GatewayOrderStatus>,
    pub amount_minor: i64,
    pub currency: String,
    pub item_name: Option<String>,
}

/// Handler for resolving order status.
///
/// Merges live gateway state with the local ledger. The gateway call is
/// best-effort: network failure degrades to local-only knowledge instead of
/// aborting resolution.
pub struct ResolveOrderHandler {
    payments: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn InvoiceLedger>,
    gateway: Arc<dyn GatewayClient>,
}

impl ResolveOrderHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        ledger: Arc<dyn InvoiceLedger>,
        gateway: Arc<dyn GatewayClient>,
    ) -> Self {
        Self {
            payments,
            ledger,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: ResolveOrderCommand,
    ) -> Result<ResolveOrderResult, CommerceError> {
        // 1. The local payment is the anchor; no payment, no resolvable order
        let payment = self
            .payments
            .find_by_reference(&cmd.order_id)
            .await?
            .ok_or_else(|| CommerceError::order_not_found(cmd.order_id.clone()))?;

        let invoice = self
            .ledger
            .find_invoice(&payment.invoice_id)
            .await?
            .ok_or(CommerceError::InvoiceNotFound(payment.invoice_id))?;

        // 2. Best-effort gateway poll
        let gateway_status = match self.gateway.get_order_status(&cmd.order_id).await {
            Ok(snapshot) => snapshot.map(|s| s.order_status),
            Err(e) => {
                tracing::warn!(
                    order_id = %cmd.order_id,
                    error = %e,
                    "gateway unreachable during resolution, using local state"
                );
                None
            }
        };

        // 3. Merge
        let status = resolve_order_status(gateway_status.as_ref(), payment.status, invoice.status);

        Ok(ResolveOrderResult {
            status,
            gateway_status,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            item_name: invoice.item_name().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::mocks::{MockGatewayClient, MockLedger};
    use crate::domain::commerce::{LineItem, PurchaseTarget};
    use crate::domain::foundation::{SubjectId, UserId};
    use crate::ports::CreateInvoiceRequest;

    const ORDER_ID: &str = "order_resolve_test";

    async fn ledger_with_order() -> Arc<MockLedger> {
        let ledger = Arc::new(MockLedger::new());
        ledger
            .create_invoice(CreateInvoiceRequest {
                customer_id: UserId::new(),
                org_id: None,
                target: PurchaseTarget::Subject(SubjectId::new()),
                line_items: vec![LineItem {
                    description: "Algebra I".to_string(),
                    amount_minor: 9900,
                }],
                currency: "USD".to_string(),
                payment_reference: ORDER_ID.to_string(),
            })
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn gateway_paid_resolves_success_over_pending_local_state() {
        let ledger = ledger_with_order().await;
        let gateway = Arc::new(MockGatewayClient::with_status(GatewayOrderStatus::Paid));
        let handler = ResolveOrderHandler::new(ledger.clone(), ledger, gateway);

        let result = handler
            .handle(ResolveOrderCommand {
                order_id: ORDER_ID.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, ResolvedOrderStatus::Success);
        assert_eq!(result.gateway_status, Some(GatewayOrderStatus::Paid));
        assert_eq!(result.amount_minor, 9900);
        assert_eq!(result.item_name.as_deref(), Some("Algebra I"));
    }

    #[tokio::test]
    async fn unreachable_gateway_degrades_to_local_state() {
        let ledger = ledger_with_order().await;
        let mut payment = ledger.payment_by_reference(ORDER_ID).unwrap();
        payment.mark_success(Some("txn_1".to_string()));
        crate::ports::PaymentRepository::update(ledger.as_ref(), &payment)
            .await
            .unwrap();

        let handler =
            ResolveOrderHandler::new(ledger.clone(), ledger, Arc::new(MockGatewayClient::unreachable()));
        let result = handler
            .handle(ResolveOrderCommand {
                order_id: ORDER_ID.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, ResolvedOrderStatus::Success);
        assert_eq!(result.gateway_status, None);
    }

    #[tokio::test]
    async fn user_dropped_resolves_failed() {
        let ledger = ledger_with_order().await;
        let gateway = Arc::new(MockGatewayClient::with_status(
            GatewayOrderStatus::UserDropped,
        ));
        let handler = ResolveOrderHandler::new(ledger.clone(), ledger, gateway);

        let result = handler
            .handle(ResolveOrderCommand {
                order_id: ORDER_ID.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, ResolvedOrderStatus::Failed);
    }

    #[tokio::test]
    async fn unknown_order_fails_not_found() {
        let ledger = Arc::new(MockLedger::new());
        let handler =
            ResolveOrderHandler::new(ledger.clone(), ledger, Arc::new(MockGatewayClient::new()));

        let result = handler
            .handle(ResolveOrderCommand {
                order_id: "order_missing".to_string(),
            })
            .await;

        assert!(matches!(result, Err(CommerceError::OrderNotFound(_))));
    }
}
