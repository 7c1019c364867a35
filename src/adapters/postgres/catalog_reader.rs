//! PostgreSQL implementation of CatalogReader.
//!
//! Read-only lookups against the catalog tables owned by the content
//! service: pricing plans, courses, subjects, and the course/subject
//! membership table.

use crate::domain::commerce::PricingPlan;
use crate::domain::foundation::{DomainError, PricingPlanId, CourseId, SubjectId};
use crate::ports::CatalogReader;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::parse_target;

/// PostgreSQL implementation of the CatalogReader port.
pub struct PostgresCatalogReader {
    pool: PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a pricing plan.
#[derive(Debug, sqlx::FromRow)]
struct PricingPlanRow {
    id: Uuid,
    scope: String,
    course_id: Option<Uuid>,
    subject_id: Option<Uuid>,
    name: String,
    amount_minor: i64,
}

impl TryFrom<PricingPlanRow> for PricingPlan {
    type Error = DomainError;

    fn try_from(row: PricingPlanRow) -> Result<Self, Self::Error> {
        let target = parse_target(&row.scope, row.course_id, row.subject_id)?;
        Ok(PricingPlan {
            id: PricingPlanId::from_uuid(row.id),
            target,
            name: row.name,
            amount_minor: row.amount_minor,
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn find_pricing_plan(
        &self,
        id: &PricingPlanId,
    ) -> Result<Option<PricingPlan>, DomainError> {
        let row: Option<PricingPlanRow> = sqlx::query_as(
            r#"
            SELECT id, scope, course_id, subject_id, name, amount_minor
            FROM pricing_plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find pricing plan: {}", e)))?;

        row.map(PricingPlan::try_from).transpose()
    }

    async fn course_subjects(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<SubjectId>, DomainError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT subject_id
            FROM course_subjects
            WHERE course_id = $1
            ORDER BY position
            "#,
        )
        .bind(course_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list course subjects: {}", e)))?;

        Ok(rows.into_iter().map(|(id,)| SubjectId::from_uuid(id)).collect())
    }

    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, DomainError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
                .bind(course_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check course: {}", e)))?;

        Ok(exists)
    }

    async fn subject_exists(&self, subject_id: &SubjectId) -> Result<bool, DomainError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM subjects WHERE id = $1)")
                .bind(subject_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check subject: {}", e)))?;

        Ok(exists)
    }
}
