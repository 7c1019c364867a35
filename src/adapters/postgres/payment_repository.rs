//! PostgreSQL implementation of PaymentRepository.

use crate::domain::commerce::{Payment, PaymentStatus};
use crate::domain::foundation::{DomainError, ErrorCode, InvoiceId, PaymentId, Timestamp};
use crate::ports::PaymentRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    invoice_id: Uuid,
    payment_reference: String,
    gateway_transaction_id: Option<String>,
    gateway_session_token: Option<String>,
    amount_minor: i64,
    currency: String,
    status: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            invoice_id: InvoiceId::from_uuid(row.invoice_id),
            payment_reference: row.payment_reference,
            gateway_transaction_id: row.gateway_transaction_id,
            gateway_session_token: row.gateway_session_token,
            amount_minor: row.amount_minor,
            currency: row.currency,
            status: parse_payment_status(&row.status)?,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

pub(super) fn parse_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "success" => Ok(PaymentStatus::Success),
        "failed" => Ok(PaymentStatus::Failed),
        "cancelled" => Ok(PaymentStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

pub(super) fn payment_status_to_string(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Success => "success",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Cancelled => "cancelled",
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, invoice_id, payment_reference, gateway_transaction_id,
           gateway_session_token, amount_minor, currency, status,
           failure_reason, created_at, updated_at
    FROM payments
"#;

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE payment_reference = $1", SELECT_PAYMENT))
                .bind(reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE invoice_id = $1", SELECT_PAYMENT))
                .bind(invoice_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                payment_reference = $2,
                gateway_transaction_id = $3,
                gateway_session_token = $4,
                status = $5,
                failure_reason = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.payment_reference)
        .bind(&payment.gateway_transaction_id)
        .bind(&payment.gateway_session_token)
        .bind(payment_status_to_string(&payment.status))
        .bind(&payment.failure_reason)
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update payment: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                payment.id.to_string(),
            ));
        }

        Ok(())
    }
}
