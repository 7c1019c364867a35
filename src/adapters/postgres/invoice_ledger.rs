//! PostgreSQL implementation of InvoiceLedger.
//!
//! Owns the atomic invoice+payment creation and the terminal-state guards on
//! invoice transitions.

use crate::domain::commerce::{
    Invoice, InvoiceStatus, LineItem, Payment, PaymentStatus, SettlementDetails,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, InvoiceId, OrgId, PaymentId, Timestamp, UserId,
};
use crate::ports::{CreateInvoiceRequest, InvoiceLedger, InvoiceWithPayment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::{parse_target, target_columns};

/// PostgreSQL implementation of the InvoiceLedger port.
pub struct PostgresInvoiceLedger {
    pool: PgPool,
}

impl PostgresInvoiceLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an invoice.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    customer_id: Uuid,
    org_id: Option<Uuid>,
    scope: String,
    course_id: Option<Uuid>,
    subject_id: Option<Uuid>,
    total_minor: i64,
    currency: String,
    status: String,
    line_items: serde_json::Value,
    status_reason: Option<String>,
    settlement: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let target = parse_target(&row.scope, row.course_id, row.subject_id)?;
        let status = parse_invoice_status(&row.status)?;
        let line_items: Vec<LineItem> =
            serde_json::from_value(row.line_items).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid line_items JSON: {}", e),
                )
            })?;
        let settlement: Option<SettlementDetails> = row
            .settlement
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid settlement JSON: {}", e),
                )
            })?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            customer_id: UserId::from_uuid(row.customer_id),
            org_id: row.org_id.map(OrgId::from_uuid),
            target,
            total_minor: row.total_minor,
            currency: row.currency,
            status,
            line_items,
            status_reason: row.status_reason,
            settlement,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_invoice_status(s: &str) -> Result<InvoiceStatus, DomainError> {
    match s.to_lowercase().as_str() {
        "draft" => Ok(InvoiceStatus::Draft),
        "pending" => Ok(InvoiceStatus::Pending),
        "paid" => Ok(InvoiceStatus::Paid),
        "failed" => Ok(InvoiceStatus::Failed),
        "cancelled" => Ok(InvoiceStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid invoice status value: {}", s),
        )),
    }
}

fn invoice_status_to_string(status: &InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "draft",
        InvoiceStatus::Pending => "pending",
        InvoiceStatus::Paid => "paid",
        InvoiceStatus::Failed => "failed",
        InvoiceStatus::Cancelled => "cancelled",
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, customer_id, org_id, scope, course_id, subject_id, total_minor,
           currency, status, line_items, status_reason, settlement, created_at, updated_at
    FROM invoices
"#;

const RETURNING_INVOICE: &str = r#"
    RETURNING id, customer_id, org_id, scope, course_id, subject_id, total_minor,
              currency, status, line_items, status_reason, settlement, created_at, updated_at
"#;

impl PostgresInvoiceLedger {
    /// Guarded transition: succeeds only from a non-terminal state, is a
    /// no-op when the invoice is already in the requested state, and rejects
    /// any other terminal state.
    async fn transition(
        &self,
        id: &InvoiceId,
        to: InvoiceStatus,
        reason: Option<&str>,
    ) -> Result<Invoice, DomainError> {
        let updated: Option<InvoiceRow> = sqlx::query_as(&format!(
            r#"
            UPDATE invoices
            SET status = $2, status_reason = $3, updated_at = $4
            WHERE id = $1 AND status IN ('draft', 'pending')
            {}
            "#,
            RETURNING_INVOICE
        ))
        .bind(id.as_uuid())
        .bind(invoice_status_to_string(&to))
        .bind(reason)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to transition invoice: {}", e)))?;

        if let Some(row) = updated {
            return Invoice::try_from(row);
        }

        // Nothing updated: either the invoice is missing or already terminal
        let current = self
            .find_invoice(id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        if current.status == to {
            return Ok(current);
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("invoice is {}", current.status.as_str()),
        ))
    }
}

#[async_trait]
impl InvoiceLedger for PostgresInvoiceLedger {
    async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceWithPayment, DomainError> {
        let now = Timestamp::now();
        let total: i64 = request.line_items.iter().map(|li| li.amount_minor).sum();
        let (scope, course_id, subject_id) = target_columns(&request.target);
        let line_items_json = serde_json::to_value(&request.line_items).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize line items: {}", e),
            )
        })?;

        let invoice = Invoice {
            id: InvoiceId::new(),
            customer_id: request.customer_id,
            org_id: request.org_id,
            target: request.target,
            total_minor: total,
            currency: request.currency.clone(),
            status: InvoiceStatus::Pending,
            line_items: request.line_items,
            status_reason: None,
            settlement: None,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: PaymentId::new(),
            invoice_id: invoice.id,
            payment_reference: request.payment_reference,
            gateway_transaction_id: None,
            gateway_session_token: None,
            amount_minor: total,
            currency: request.currency,
            status: PaymentStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };

        // Invoice and payment land together or not at all
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer_id, org_id, scope, course_id, subject_id, total_minor,
                currency, status, line_items, status_reason, settlement, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.customer_id.as_uuid())
        .bind(invoice.org_id.map(|o| *o.as_uuid()))
        .bind(scope)
        .bind(course_id)
        .bind(subject_id)
        .bind(invoice.total_minor)
        .bind(&invoice.currency)
        .bind(invoice_status_to_string(&invoice.status))
        .bind(&line_items_json)
        .bind(&invoice.status_reason)
        .bind(None::<serde_json::Value>)
        .bind(invoice.created_at.as_datetime())
        .bind(invoice.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert invoice: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, invoice_id, payment_reference, gateway_transaction_id,
                gateway_session_token, amount_minor, currency, status,
                failure_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.invoice_id.as_uuid())
        .bind(&payment.payment_reference)
        .bind(&payment.gateway_transaction_id)
        .bind(&payment.gateway_session_token)
        .bind(payment.amount_minor)
        .bind(&payment.currency)
        .bind(super::payment_repository::payment_status_to_string(
            &payment.status,
        ))
        .bind(&payment.failure_reason)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert payment: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit invoice: {}", e)))?;

        Ok(InvoiceWithPayment { invoice, payment })
    }

    async fn mark_paid(
        &self,
        id: &InvoiceId,
        settlement: SettlementDetails,
    ) -> Result<Invoice, DomainError> {
        let settlement_json = serde_json::to_value(&settlement).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize settlement: {}", e),
            )
        })?;

        let updated: Option<InvoiceRow> = sqlx::query_as(&format!(
            r#"
            UPDATE invoices
            SET status = 'paid', status_reason = NULL, settlement = $2, updated_at = $3
            WHERE id = $1 AND status IN ('draft', 'pending')
            {}
            "#,
            RETURNING_INVOICE
        ))
        .bind(id.as_uuid())
        .bind(&settlement_json)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark invoice paid: {}", e)))?;

        if let Some(row) = updated {
            return Invoice::try_from(row);
        }

        let current = self
            .find_invoice(id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        if current.is_paid() {
            return Ok(current);
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("invoice is {}", current.status.as_str()),
        ))
    }

    async fn reopen(&self, id: &InvoiceId) -> Result<Invoice, DomainError> {
        let updated: Option<InvoiceRow> = sqlx::query_as(&format!(
            r#"
            UPDATE invoices
            SET status = 'pending', status_reason = NULL, updated_at = $2
            WHERE id = $1 AND status IN ('failed', 'cancelled')
            {}
            "#,
            RETURNING_INVOICE
        ))
        .bind(id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to reopen invoice: {}", e)))?;

        if let Some(row) = updated {
            return Invoice::try_from(row);
        }

        let current = self
            .find_invoice(id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        match current.status {
            InvoiceStatus::Draft | InvoiceStatus::Pending => Ok(current),
            _ => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("invoice is {}", current.status.as_str()),
            )),
        }
    }

    async fn mark_failed(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError> {
        self.transition(id, InvoiceStatus::Failed, Some(reason)).await
    }

    async fn mark_cancelled(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError> {
        self.transition(id, InvoiceStatus::Cancelled, Some(reason))
            .await
    }

    async fn find_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_INVOICE))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find invoice: {}", e)))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 ORDER BY created_at DESC",
            SELECT_INVOICE
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list invoices: {}", e)))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }
}
