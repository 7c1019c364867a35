//! GrantSubscriptionHandler - Command handler for granting access after payment.

use std::sync::Arc;

use crate::domain::commerce::{CommerceError, PurchaseTarget, UserSubscription};
use crate::domain::foundation::{OrgId, UserId};
use crate::ports::{CatalogReader, SubscriptionRepository};

/// Command to grant a subscription.
#[derive(Debug, Clone)]
pub struct GrantSubscriptionCommand {
    pub user_id: UserId,
    pub org_id: Option<OrgId>,
    pub target: PurchaseTarget,
    /// Amount actually paid, in minor units; zero grants a FREE subscription.
    pub amount_paid_minor: i64,
    pub gateway_order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

/// Result of a grant attempt.
#[derive(Debug, Clone)]
pub struct GrantSubscriptionResult {
    pub subscription: UserSubscription,
    /// False when the idempotency gate matched an existing grant.
    pub newly_granted: bool,
}

/// Handler for granting subscriptions.
///
/// Grants are the terminal effect of a successful payment and must survive
/// at-least-once webhook delivery: the idempotency gate on the gateway keys
/// runs before anything else, unconditionally.
pub struct GrantSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogReader>,
}

impl GrantSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            subscriptions,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: GrantSubscriptionCommand,
    ) -> Result<GrantSubscriptionResult, CommerceError> {
        // 1. Idempotency gate: an existing subscription matching either
        //    gateway key is returned unchanged.
        let order_key = cmd.gateway_order_id.as_deref().filter(|s| !s.is_empty());
        let txn_key = cmd.transaction_id.as_deref().filter(|s| !s.is_empty());
        if order_key.is_some() || txn_key.is_some() {
            if let Some(existing) = self
                .subscriptions
                .find_by_gateway_keys(order_key, txn_key)
                .await?
            {
                tracing::info!(
                    subscription_id = %existing.id,
                    gateway_order_id = ?order_key,
                    "grant already applied, returning existing subscription"
                );
                return Ok(GrantSubscriptionResult {
                    subscription: existing,
                    newly_granted: false,
                });
            }
        }

        // 2. Concurrent purchases of the same target are detected and
        //    logged, never blocked: the payment already settled.
        if let Some(existing) = self
            .subscriptions
            .find_active_covering(&cmd.user_id, &cmd.target)
            .await?
        {
            tracing::warn!(
                user_id = %cmd.user_id,
                existing_subscription_id = %existing.id,
                gateway_order_id = ?order_key,
                "duplicate active subscription detected for target, granting anyway"
            );
        }

        // 3. Resolve the subject set for the purchased target
        let (course_id, subject_ids) = match &cmd.target {
            PurchaseTarget::Course(course_id) => {
                if !self.catalog.course_exists(course_id).await? {
                    return Err(CommerceError::invalid_scope(format!(
                        "course {} does not exist",
                        course_id
                    )));
                }
                let subjects = self.catalog.course_subjects(course_id).await?;
                (Some(*course_id), subjects)
            }
            PurchaseTarget::Subject(subject_id) => {
                if !self.catalog.subject_exists(subject_id).await? {
                    return Err(CommerceError::invalid_scope(format!(
                        "subject {} does not exist",
                        subject_id
                    )));
                }
                (None, vec![*subject_id])
            }
        };

        // 4. Build and persist the subscription
        let subscription = UserSubscription::grant(
            cmd.user_id,
            cmd.org_id,
            cmd.target.scope(),
            course_id,
            subject_ids,
            cmd.amount_paid_minor,
            cmd.gateway_order_id,
            cmd.transaction_id,
            cmd.payment_method,
        );
        self.subscriptions.save(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            user_id = %subscription.user_id,
            scope = subscription.scope.as_str(),
            subscription_type = subscription.subscription_type.as_str(),
            "subscription granted"
        );

        Ok(GrantSubscriptionResult {
            subscription,
            newly_granted: true,
        })
    }
}
