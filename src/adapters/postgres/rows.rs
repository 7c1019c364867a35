//! Shared row mapping helpers for the postgres adapters.

use crate::domain::commerce::PurchaseTarget;
use crate::domain::foundation::{CourseId, DomainError, ErrorCode, SubjectId};
use uuid::Uuid;

/// Maps a purchase target onto its (scope, course_id, subject_id) columns.
pub(super) fn target_columns(target: &PurchaseTarget) -> (&'static str, Option<Uuid>, Option<Uuid>) {
    match target {
        PurchaseTarget::Course(course_id) => ("course", Some(*course_id.as_uuid()), None),
        PurchaseTarget::Subject(subject_id) => ("subject", None, Some(*subject_id.as_uuid())),
    }
}

/// Rebuilds a purchase target from its columns.
pub(super) fn parse_target(
    scope: &str,
    course_id: Option<Uuid>,
    subject_id: Option<Uuid>,
) -> Result<PurchaseTarget, DomainError> {
    match (scope.to_lowercase().as_str(), course_id, subject_id) {
        ("course", Some(course_id), _) => Ok(PurchaseTarget::Course(CourseId::from_uuid(course_id))),
        ("subject", _, Some(subject_id)) => {
            Ok(PurchaseTarget::Subject(SubjectId::from_uuid(subject_id)))
        }
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid scope columns: scope={}", scope),
        )),
    }
}
