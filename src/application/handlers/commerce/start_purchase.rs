//! StartPurchaseHandler - Command handler for initiating a purchase.

use std::sync::Arc;

use crate::domain::commerce::{mint_payment_reference, CommerceError, LineItem};
use crate::domain::foundation::{InvoiceId, OrgId, PricingPlanId, UserId};
use crate::ports::{
    CatalogReader, CreateInvoiceRequest, CreateOrderRequest, CustomerDetails, GatewayClient,
    InvoiceLedger, PaymentRepository, SubscriptionRepository,
};

/// Command to start a purchase.
#[derive(Debug, Clone)]
pub struct StartPurchaseCommand {
    pub user_id: UserId,
    pub org_id: Option<OrgId>,
    pub pricing_plan_id: PricingPlanId,
    pub customer: CustomerDetails,
    pub currency: String,
}

/// Result of starting a purchase: everything the client SDK needs to open
/// the gateway checkout.
#[derive(Debug, Clone)]
pub struct StartPurchaseResult {
    /// The gateway order id, also the payment_reference for later polling.
    pub order_id: String,
    pub gateway_session_token: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub invoice_id: InvoiceId,
}

/// Handler for starting purchases.
///
/// Mints the gateway order id locally and hands it to the gateway, so inbound
/// webhooks correlate back to the payment row by that single reference.
pub struct StartPurchaseHandler {
    catalog: Arc<dyn CatalogReader>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn InvoiceLedger>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn GatewayClient>,
}

impl StartPurchaseHandler {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn InvoiceLedger>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn GatewayClient>,
    ) -> Self {
        Self {
            catalog,
            subscriptions,
            ledger,
            payments,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartPurchaseCommand,
    ) -> Result<StartPurchaseResult, CommerceError> {
        // 1. Resolve the pricing plan
        let plan = self
            .catalog
            .find_pricing_plan(&cmd.pricing_plan_id)
            .await?
            .ok_or_else(|| {
                CommerceError::pricing_plan_not_found(cmd.pricing_plan_id.to_string())
            })?;

        // 2. Reject if an active subscription already covers the target.
        //    Not transactional with the grant path; a concurrent duplicate is
        //    detected downstream, not hard-blocked here.
        if self
            .subscriptions
            .find_active_covering(&cmd.user_id, &plan.target)
            .await?
            .is_some()
        {
            return Err(CommerceError::already_subscribed(cmd.user_id));
        }

        // 3. Mint the gateway order id and open the invoice + payment pair
        let payment_reference = mint_payment_reference();
        let created = self
            .ledger
            .create_invoice(CreateInvoiceRequest {
                customer_id: cmd.user_id,
                org_id: cmd.org_id,
                target: plan.target,
                line_items: vec![LineItem {
                    description: plan.name.clone(),
                    amount_minor: plan.amount_minor,
                }],
                currency: cmd.currency.clone(),
                payment_reference: payment_reference.clone(),
            })
            .await?;

        // 4. Create the order at the gateway under our reference
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                order_id: payment_reference.clone(),
                amount_minor: plan.amount_minor,
                currency: cmd.currency.clone(),
                customer_id: cmd.user_id,
                customer_details: cmd.customer,
                metadata: Some(serde_json::json!({
                    "invoice_id": created.invoice.id.to_string(),
                })),
            })
            .await
            .map_err(|e| CommerceError::gateway_unavailable(e.to_string()))?;

        // 5. Persist the session token. A crash between steps 4 and 5 leaves
        //    a token-less payment row, detectable by reconciliation.
        let mut payment = created.payment;
        payment.gateway_session_token = order.session_token.clone();
        self.payments.update(&payment).await?;

        tracing::info!(
            order_id = %payment_reference,
            invoice_id = %created.invoice.id,
            user_id = %cmd.user_id,
            amount_minor = plan.amount_minor,
            "purchase started"
        );

        Ok(StartPurchaseResult {
            order_id: payment_reference,
            gateway_session_token: order.session_token,
            amount_minor: plan.amount_minor,
            currency: cmd.currency,
            invoice_id: created.invoice.id,
        })
    }
}
