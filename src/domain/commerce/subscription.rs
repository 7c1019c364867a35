//! UserSubscription entity: granted access from a successful payment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, OrgId, SubjectId, SubscriptionId, Timestamp, UserId};

use super::pricing::PurchaseScope;

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Expired => "EXPIRED",
            SubscriptionStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Paid vs. free, derived purely from the amount paid so a client can never
/// spoof the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionType {
    Free,
    Paid,
}

impl SubscriptionType {
    /// Zero-amount pricing yields FREE, anything else PAID.
    pub fn from_amount(amount_minor: i64) -> Self {
        if amount_minor == 0 {
            SubscriptionType::Free
        } else {
            SubscriptionType::Paid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Free => "FREE",
            SubscriptionType::Paid => "PAID",
        }
    }
}

/// Default validity window for a one-time purchase, in days.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Granted access for a user, created exactly once per successful payment.
///
/// A COURSE-scope subscription stores the course's full subject set so
/// subject-level access checks elsewhere never special-case granularity.
/// SUBJECT scope stores exactly the one purchased subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub org_id: Option<OrgId>,
    pub scope: PurchaseScope,
    pub course_id: Option<CourseId>,
    pub subject_ids: Vec<SubjectId>,
    pub status: SubscriptionStatus,
    pub subscription_type: SubscriptionType,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Mirrors `end_date`; one-time purchases never renew.
    pub next_billing_date: Timestamp,
    pub auto_renew: bool,
    /// Idempotency keys tying this grant to the gateway attempt.
    pub gateway_order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub amount_paid_minor: i64,
    pub created_at: Timestamp,
}

impl UserSubscription {
    /// Builds a new ACTIVE subscription with the default one-year window.
    #[allow(clippy::too_many_arguments)]
    pub fn grant(
        user_id: UserId,
        org_id: Option<OrgId>,
        scope: PurchaseScope,
        course_id: Option<CourseId>,
        subject_ids: Vec<SubjectId>,
        amount_paid_minor: i64,
        gateway_order_id: Option<String>,
        transaction_id: Option<String>,
        payment_method: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        let end = now.add_days(DEFAULT_VALIDITY_DAYS);
        Self {
            id: SubscriptionId::new(),
            user_id,
            org_id,
            scope,
            course_id,
            subject_ids,
            status: SubscriptionStatus::Active,
            subscription_type: SubscriptionType::from_amount(amount_paid_minor),
            start_date: now,
            end_date: end,
            next_billing_date: end,
            auto_renew: false,
            gateway_order_id,
            transaction_id,
            payment_method,
            amount_paid_minor,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Whether this subscription grants access to the given subject.
    pub fn covers_subject(&self, subject_id: &SubjectId) -> bool {
        self.is_active() && self.subject_ids.contains(subject_id)
    }

    /// Whether this subscription grants access to the given course.
    pub fn covers_course(&self, course_id: &CourseId) -> bool {
        self.is_active() && self.course_id.as_ref() == Some(course_id)
    }

    /// Matches this subscription against gateway idempotency keys.
    pub fn matches_gateway_keys(
        &self,
        gateway_order_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> bool {
        let order_match = match (gateway_order_id, self.gateway_order_id.as_deref()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let txn_match = match (transaction_id, self.transaction_id.as_deref()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        order_match || txn_match
    }
}
