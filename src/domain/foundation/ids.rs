//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a platform user.
    UserId
);

uuid_id!(
    /// Unique identifier for an organization.
    OrgId
);

uuid_id!(
    /// Unique identifier for a course in the catalog.
    CourseId
);

uuid_id!(
    /// Unique identifier for a subject in the catalog.
    SubjectId
);

uuid_id!(
    /// Unique identifier for a pricing plan.
    PricingPlanId
);

uuid_id!(
    /// Unique identifier for an invoice.
    InvoiceId
);

uuid_id!(
    /// Unique identifier for a payment record.
    PaymentId
);

uuid_id!(
    /// Unique identifier for a user subscription.
    SubscriptionId
);
