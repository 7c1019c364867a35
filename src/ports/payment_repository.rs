//! Payment repository port.
//!
//! Persistence contract for payment rows. The payment_reference is the
//! natural key webhooks and user polling correlate on.

use crate::domain::commerce::Payment;
use crate::domain::foundation::{DomainError, InvoiceId};
use async_trait::async_trait;

/// Repository port for payment persistence.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find a payment by its current gateway order id.
    ///
    /// Returns `None` if no payment carries this reference; a superseded
    /// reference is not findable.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, DomainError>;

    /// Find the payment attached to an invoice.
    async fn find_by_invoice(&self, invoice_id: &InvoiceId)
        -> Result<Option<Payment>, DomainError>;

    /// Persist the current state of a payment.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the payment doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, payment: &Payment) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn payment_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }
}
