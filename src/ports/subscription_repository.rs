//! Subscription repository port.
//!
//! Persistence contract for granted subscriptions, including the idempotency
//! lookup used to make webhook-driven grants replay-safe.

use crate::domain::commerce::{PurchaseTarget, UserSubscription};
use crate::domain::foundation::{DomainError, UserId};
use async_trait::async_trait;

/// Repository port for subscription persistence.
///
/// Implementations should back `find_by_gateway_keys` with an index on
/// (gateway_order_id) and (transaction_id); a unique constraint on either is
/// the recommended hardening against the grant race.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persist a new subscription.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, subscription: &UserSubscription) -> Result<(), DomainError>;

    /// Find a subscription matching either gateway idempotency key.
    ///
    /// Returns `None` when neither key matches an existing subscription.
    async fn find_by_gateway_keys(
        &self,
        gateway_order_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, DomainError>;

    /// Find an ACTIVE subscription covering the target for the user.
    ///
    /// For a COURSE target this matches on course id; for a SUBJECT target it
    /// matches any active subscription whose subject set contains it.
    async fn find_active_covering(
        &self,
        user_id: &UserId,
        target: &PurchaseTarget,
    ) -> Result<Option<UserSubscription>, DomainError>;

    /// List a user's ACTIVE subscriptions, most recent first.
    async fn list_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError>;
}
