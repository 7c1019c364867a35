//! Commerce-specific error types.
//!
//! Errors produced by order orchestration, webhook processing, status
//! resolution and subscription granting.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | PricingPlanNotFound | 404 |
//! | OrderNotFound | 404 |
//! | InvoiceNotFound | 404 |
//! | AlreadySubscribed | 409 |
//! | InvalidState | 409 |
//! | Forbidden | 403 |
//! | InvalidSignature | 401 |
//! | MissingOrderCorrelation | 400 |
//! | InvalidScope | 400 |
//! | ValidationFailed | 400 |
//! | GatewayUnavailable | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, InvoiceId, UserId};

/// Commerce-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Pricing plan was not found.
    PricingPlanNotFound(String),

    /// No payment matches the given gateway order id.
    OrderNotFound(String),

    /// Invoice was not found.
    InvoiceNotFound(InvoiceId),

    /// An ACTIVE subscription already covers this target for the user.
    AlreadySubscribed(UserId),

    /// The operation is not valid in the current payment/invoice state.
    InvalidState {
        current: String,
        attempted: String,
    },

    /// The caller does not own the order.
    Forbidden,

    /// Webhook signature verification failed.
    InvalidSignature(String),

    /// A webhook arrived for an order this system never created, or whose
    /// reference has since been superseded by a retry.
    MissingOrderCorrelation(String),

    /// Neither a course nor a subject resolves from the purchase context.
    InvalidScope(String),

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// The gateway could not be reached or returned an unusable response.
    GatewayUnavailable(String),

    /// Infrastructure error.
    Infrastructure(String),
}

impl CommerceError {
    pub fn pricing_plan_not_found(reference: impl Into<String>) -> Self {
        CommerceError::PricingPlanNotFound(reference.into())
    }

    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        CommerceError::OrderNotFound(order_id.into())
    }

    pub fn invoice_not_found(id: InvoiceId) -> Self {
        CommerceError::InvoiceNotFound(id)
    }

    pub fn already_subscribed(user_id: UserId) -> Self {
        CommerceError::AlreadySubscribed(user_id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        CommerceError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn invalid_signature(reason: impl Into<String>) -> Self {
        CommerceError::InvalidSignature(reason.into())
    }

    pub fn missing_order_correlation(order_id: impl Into<String>) -> Self {
        CommerceError::MissingOrderCorrelation(order_id.into())
    }

    pub fn invalid_scope(message: impl Into<String>) -> Self {
        CommerceError::InvalidScope(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CommerceError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_unavailable(message: impl Into<String>) -> Self {
        CommerceError::GatewayUnavailable(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CommerceError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CommerceError::PricingPlanNotFound(_) => ErrorCode::PricingPlanNotFound,
            CommerceError::OrderNotFound(_) => ErrorCode::PaymentNotFound,
            CommerceError::InvoiceNotFound(_) => ErrorCode::InvoiceNotFound,
            CommerceError::AlreadySubscribed(_) => ErrorCode::AlreadySubscribed,
            CommerceError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            CommerceError::Forbidden => ErrorCode::Forbidden,
            CommerceError::InvalidSignature(_) => ErrorCode::InvalidWebhookSignature,
            CommerceError::MissingOrderCorrelation(_) => ErrorCode::MissingOrderCorrelation,
            CommerceError::InvalidScope(_) => ErrorCode::InvalidScope,
            CommerceError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            CommerceError::GatewayUnavailable(_) => ErrorCode::GatewayUnavailable,
            CommerceError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            CommerceError::PricingPlanNotFound(reference) => {
                format!("Pricing plan not found: {}", reference)
            }
            CommerceError::OrderNotFound(order_id) => format!("Order not found: {}", order_id),
            CommerceError::InvoiceNotFound(id) => format!("Invoice not found: {}", id),
            CommerceError::AlreadySubscribed(user_id) => {
                format!("User {} already has an active subscription for this item", user_id)
            }
            CommerceError::InvalidState { current, attempted } => {
                format!("Cannot {} an order in {} state", attempted, current)
            }
            CommerceError::Forbidden => "Order does not belong to the caller".to_string(),
            CommerceError::InvalidSignature(reason) => {
                format!("Webhook signature verification failed: {}", reason)
            }
            CommerceError::MissingOrderCorrelation(order_id) => {
                format!("No payment correlates to gateway order: {}", order_id)
            }
            CommerceError::InvalidScope(message) => {
                format!("Purchase scope does not resolve: {}", message)
            }
            CommerceError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            CommerceError::GatewayUnavailable(message) => {
                format!("Payment gateway unavailable: {}", message)
            }
            CommerceError::Infrastructure(message) => format!("Error: {}", message),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommerceError::Infrastructure(_) | CommerceError::GatewayUnavailable(_)
        )
    }
}

impl std::fmt::Display for CommerceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CommerceError {}

impl From<DomainError> for CommerceError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PricingPlanNotFound => CommerceError::PricingPlanNotFound(err.message),
            ErrorCode::PaymentNotFound => CommerceError::OrderNotFound(err.message),
            ErrorCode::CourseNotFound | ErrorCode::SubjectNotFound | ErrorCode::InvalidScope => {
                CommerceError::InvalidScope(err.message)
            }
            ErrorCode::InvalidStateTransition => CommerceError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.message,
            },
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                CommerceError::ValidationFailed {
                    field: "unknown".to_string(),
                    message: err.message,
                }
            }
            ErrorCode::ExternalServiceError | ErrorCode::GatewayUnavailable => {
                CommerceError::GatewayUnavailable(err.message)
            }
            _ => CommerceError::Infrastructure(err.message),
        }
    }
}

impl From<CommerceError> for DomainError {
    fn from(err: CommerceError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
