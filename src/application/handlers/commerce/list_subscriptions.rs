//! ListSubscriptionsHandler - Query handler for a user's active subscriptions.

use std::sync::Arc;

use crate::domain::commerce::{CommerceError, UserSubscription};
use crate::domain::foundation::UserId;
use crate::ports::SubscriptionRepository;

/// Command to list active subscriptions.
#[derive(Debug, Clone)]
pub struct ListSubscriptionsCommand {
    pub user_id: UserId,
}

/// Result of a subscriptions query.
#[derive(Debug, Clone)]
pub struct ListSubscriptionsResult {
    pub subscriptions: Vec<UserSubscription>,
}

/// Handler for listing a user's active subscriptions.
pub struct ListSubscriptionsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl ListSubscriptionsHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(
        &self,
        cmd: ListSubscriptionsCommand,
    ) -> Result<ListSubscriptionsResult, CommerceError> {
        let subscriptions = self.subscriptions.list_active_for_user(&cmd.user_id).await?;
        Ok(ListSubscriptionsResult { subscriptions })
    }
}
