//! PostgreSQL implementation of SubscriptionRepository.

use crate::domain::commerce::{
    PurchaseScope, PurchaseTarget, SubscriptionStatus, SubscriptionType, UserSubscription,
};
use crate::domain::foundation::{
    CourseId, DomainError, ErrorCode, OrgId, SubjectId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::SubscriptionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the SubscriptionRepository port.
///
/// `gateway_order_id` and `transaction_id` carry unique indexes, which
/// hardens the application-level idempotency gate against concurrent
/// duplicate webhooks.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    org_id: Option<Uuid>,
    scope: String,
    course_id: Option<Uuid>,
    subject_ids: Vec<Uuid>,
    status: String,
    subscription_type: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    next_billing_date: DateTime<Utc>,
    auto_renew: bool,
    gateway_order_id: Option<String>,
    transaction_id: Option<String>,
    payment_method: Option<String>,
    amount_paid_minor: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for UserSubscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(UserSubscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            org_id: row.org_id.map(OrgId::from_uuid),
            scope: parse_scope(&row.scope)?,
            course_id: row.course_id.map(CourseId::from_uuid),
            subject_ids: row.subject_ids.into_iter().map(SubjectId::from_uuid).collect(),
            status: parse_subscription_status(&row.status)?,
            subscription_type: parse_subscription_type(&row.subscription_type)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            next_billing_date: Timestamp::from_datetime(row.next_billing_date),
            auto_renew: row.auto_renew,
            gateway_order_id: row.gateway_order_id,
            transaction_id: row.transaction_id,
            payment_method: row.payment_method,
            amount_paid_minor: row.amount_paid_minor,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_scope(s: &str) -> Result<PurchaseScope, DomainError> {
    match s.to_lowercase().as_str() {
        "course" => Ok(PurchaseScope::Course),
        "subject" => Ok(PurchaseScope::Subject),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid scope value: {}", s),
        )),
    }
}

fn scope_to_string(scope: &PurchaseScope) -> &'static str {
    match scope {
        PurchaseScope::Course => "course",
        PurchaseScope::Subject => "subject",
    }
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "active" => Ok(SubscriptionStatus::Active),
        "expired" => Ok(SubscriptionStatus::Expired),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription status value: {}", s),
        )),
    }
}

fn subscription_status_to_string(status: &SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Expired => "expired",
        SubscriptionStatus::Cancelled => "cancelled",
    }
}

fn parse_subscription_type(s: &str) -> Result<SubscriptionType, DomainError> {
    match s.to_lowercase().as_str() {
        "free" => Ok(SubscriptionType::Free),
        "paid" => Ok(SubscriptionType::Paid),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription type value: {}", s),
        )),
    }
}

fn subscription_type_to_string(sub_type: &SubscriptionType) -> &'static str {
    match sub_type {
        SubscriptionType::Free => "free",
        SubscriptionType::Paid => "paid",
    }
}

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, user_id, org_id, scope, course_id, subject_ids, status,
           subscription_type, start_date, end_date, next_billing_date,
           auto_renew, gateway_order_id, transaction_id, payment_method,
           amount_paid_minor, created_at
    FROM user_subscriptions
"#;

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn save(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        let subject_uuids: Vec<Uuid> = subscription
            .subject_ids
            .iter()
            .map(|s| *s.as_uuid())
            .collect();

        sqlx::query(
            r#"
            INSERT INTO user_subscriptions (
                id, user_id, org_id, scope, course_id, subject_ids, status,
                subscription_type, start_date, end_date, next_billing_date,
                auto_renew, gateway_order_id, transaction_id, payment_method,
                amount_paid_minor, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_uuid())
        .bind(subscription.org_id.map(|o| *o.as_uuid()))
        .bind(scope_to_string(&subscription.scope))
        .bind(subscription.course_id.map(|c| *c.as_uuid()))
        .bind(&subject_uuids)
        .bind(subscription_status_to_string(&subscription.status))
        .bind(subscription_type_to_string(&subscription.subscription_type))
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.next_billing_date.as_datetime())
        .bind(subscription.auto_renew)
        .bind(&subscription.gateway_order_id)
        .bind(&subscription.transaction_id)
        .bind(&subscription.payment_method)
        .bind(subscription.amount_paid_minor)
        .bind(subscription.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint().is_some() {
                    return DomainError::new(
                        ErrorCode::AlreadyGranted,
                        "Subscription already exists for this payment",
                    );
                }
            }
            DomainError::database(format!("Failed to save subscription: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_gateway_keys(
        &self,
        gateway_order_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE ($1::text IS NOT NULL AND gateway_order_id = $1)
               OR ($2::text IS NOT NULL AND transaction_id = $2)
            LIMIT 1
            "#,
            SELECT_SUBSCRIPTION
        ))
        .bind(gateway_order_id)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(UserSubscription::try_from).transpose()
    }

    async fn find_active_covering(
        &self,
        user_id: &UserId,
        target: &PurchaseTarget,
    ) -> Result<Option<UserSubscription>, DomainError> {
        let row: Option<SubscriptionRow> = match target {
            PurchaseTarget::Course(course_id) => {
                sqlx::query_as(&format!(
                    "{} WHERE user_id = $1 AND status = 'active' AND course_id = $2 LIMIT 1",
                    SELECT_SUBSCRIPTION
                ))
                .bind(user_id.as_uuid())
                .bind(course_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
            }
            PurchaseTarget::Subject(subject_id) => {
                sqlx::query_as(&format!(
                    "{} WHERE user_id = $1 AND status = 'active' AND $2 = ANY(subject_ids) LIMIT 1",
                    SELECT_SUBSCRIPTION
                ))
                .bind(user_id.as_uuid())
                .bind(subject_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(|e| DomainError::database(format!("Failed to find subscription: {}", e)))?;

        row.map(UserSubscription::try_from).transpose()
    }

    async fn list_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND status = 'active' ORDER BY created_at DESC",
            SELECT_SUBSCRIPTION
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list subscriptions: {}", e)))?;

        rows.into_iter().map(UserSubscription::try_from).collect()
    }
}
