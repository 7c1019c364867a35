//! Payment gateway port.
//!
//! Defines the contract for the external payment gateway: order creation and
//! status polling. Stateless by design; all persistence happens behind the
//! repository ports.
//!
//! # Design
//!
//! - **Caller-minted order ids**: the orchestrator chooses the order id and
//!   hands it to the gateway, so webhooks correlate back without a lookup table
//! - **Bounded timeouts**: implementations must enforce request timeouts

use crate::domain::commerce::GatewayOrderStatus;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for the external payment gateway.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Create an order at the gateway under the caller-supplied order id.
    ///
    /// Returns the gateway's confirmation including the checkout session
    /// token the client SDK needs to open the payment screen.
    async fn create_order(&self, request: CreateOrderRequest)
        -> Result<GatewayOrder, GatewayError>;

    /// Fetch the live status of an order.
    ///
    /// Returns `None` if the gateway does not know the order.
    async fn get_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrderSnapshot>, GatewayError>;
}

/// Request to create a gateway order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// The order id this system minted; becomes the gateway order id.
    pub order_id: String,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Internal user id, forwarded as the gateway customer reference.
    pub customer_id: UserId,

    /// Customer contact details required by the gateway.
    pub customer_details: CustomerDetails,

    /// Free-form metadata echoed back in webhooks.
    pub metadata: Option<serde_json::Value>,
}

/// Customer details forwarded to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A freshly created gateway order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// The gateway's order id; equals the requested order id.
    pub order_id: String,

    /// Checkout session token for the client SDK.
    pub session_token: Option<String>,
}

/// Live state of a gateway order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderSnapshot {
    pub order_status: GatewayOrderStatus,

    /// Session token, still present while the checkout session is open.
    pub session_token: Option<String>,

    /// The gateway's transaction id once a payment attempt completed.
    pub transaction_id: Option<String>,

    pub failure_reason: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Network connectivity or timeout failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    /// The gateway rejected our credentials.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Authentication, message)
    }

    /// The gateway returned an error or unusable payload.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Api, message)
    }

    /// Whether the operation can be safely retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, GatewayErrorCode::Network)
    }
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorCode {
    Network,
    Authentication,
    Api,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self.code {
            GatewayErrorCode::Network => "network",
            GatewayErrorCode::Authentication => "authentication",
            GatewayErrorCode::Api => "api",
        };
        write!(f, "{}: {}", code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::new(ErrorCode::GatewayUnavailable, err.message)
    }
}
