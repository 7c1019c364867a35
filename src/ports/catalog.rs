//! Catalog read port.
//!
//! Read-only view over the course catalog owned elsewhere in the platform:
//! pricing plans, course composition, subject existence. This subsystem never
//! writes catalog data.

use crate::domain::commerce::PricingPlan;
use crate::domain::foundation::{CourseId, DomainError, PricingPlanId, SubjectId};
use async_trait::async_trait;

/// Read port over the catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Find a pricing plan by id.
    ///
    /// Returns `None` if not found.
    async fn find_pricing_plan(
        &self,
        id: &PricingPlanId,
    ) -> Result<Option<PricingPlan>, DomainError>;

    /// The full subject set composing a course.
    ///
    /// Returns an empty vector for an unknown course; callers distinguish
    /// "unknown course" via `course_exists` when it matters.
    async fn course_subjects(&self, course_id: &CourseId) -> Result<Vec<SubjectId>, DomainError>;

    /// Whether a course exists in the catalog.
    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, DomainError>;

    /// Whether a subject exists in the catalog.
    async fn subject_exists(&self, subject_id: &SubjectId) -> Result<bool, DomainError>;
}
