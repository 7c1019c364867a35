//! Shared building blocks for the domain layer: typed ids, timestamps, and
//! the infrastructure error type used by the ports.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use ids::{
    CourseId, InvoiceId, OrgId, PaymentId, PricingPlanId, SubjectId, SubscriptionId, UserId,
};
pub use timestamp::Timestamp;
