//! Pricing plans and purchase scope value objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CourseId, PricingPlanId, SubjectId};

/// Whether a purchase applies to an entire course or a single subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseScope {
    Course,
    Subject,
}

impl PurchaseScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseScope::Course => "COURSE",
            PurchaseScope::Subject => "SUBJECT",
        }
    }
}

/// The concrete catalog entity a purchase targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseTarget {
    Course(CourseId),
    Subject(SubjectId),
}

impl PurchaseTarget {
    pub fn scope(&self) -> PurchaseScope {
        match self {
            PurchaseTarget::Course(_) => PurchaseScope::Course,
            PurchaseTarget::Subject(_) => PurchaseScope::Subject,
        }
    }

    pub fn course_id(&self) -> Option<CourseId> {
        match self {
            PurchaseTarget::Course(id) => Some(*id),
            PurchaseTarget::Subject(_) => None,
        }
    }

    pub fn subject_id(&self) -> Option<SubjectId> {
        match self {
            PurchaseTarget::Course(_) => None,
            PurchaseTarget::Subject(id) => Some(*id),
        }
    }
}

/// A purchasable price point for a course or subject.
///
/// Read-only to this subsystem; created by catalog administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub id: PricingPlanId,
    pub target: PurchaseTarget,
    /// Display name of the priced item, carried onto invoice line items.
    pub name: String,
    /// Price in minor currency units (e.g. cents).
    pub amount_minor: i64,
}

impl PricingPlan {
    pub fn scope(&self) -> PurchaseScope {
        self.target.scope()
    }

    /// Zero-amount plans grant free subscriptions.
    pub fn is_free(&self) -> bool {
        self.amount_minor == 0
    }
}
