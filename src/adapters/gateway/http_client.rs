//! HTTP payment gateway adapter.
//!
//! Implements the `GatewayClient` trait against the gateway's REST API.
//! Order ids are minted by the caller and passed through unchanged, so the
//! gateway's order id equals the local payment reference.
//!
//! # Security
//!
//! - Credentials handled via `secrecy::SecretString`, sent as headers on
//!   every request
//! - All requests run under the configured timeout

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::domain::commerce::GatewayOrderStatus;
use crate::ports::{
    CreateOrderRequest, GatewayClient, GatewayError, GatewayOrder, GatewayOrderSnapshot,
};

/// Gateway API version sent with every request.
const API_VERSION: &str = "2023-08-01";

/// HTTP gateway adapter configuration.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    api_key: SecretString,
    api_secret: SecretString,
    base_url: String,
    request_timeout: std::time::Duration,
}

impl HttpGatewayConfig {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
        request_timeout: std::time::Duration,
    ) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_secret: SecretString::new(api_secret.into()),
            base_url: base_url.into(),
            request_timeout,
        }
    }
}

impl From<&GatewayConfig> for HttpGatewayConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.base_url.clone(),
            config.request_timeout(),
        )
    }
}

/// HTTP payment gateway adapter.
pub struct HttpGatewayClient {
    config: HttpGatewayConfig,
    http_client: reqwest::Client,
}

impl HttpGatewayClient {
    /// Create a new gateway client with the given configuration.
    ///
    /// Falls back to a default client if the builder fails, which only
    /// happens when the TLS backend cannot initialize.
    pub fn new(config: HttpGatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-client-id", self.config.api_key.expose_secret())
            .header("x-client-secret", self.config.api_secret.expose_secret())
            .header("x-api-version", API_VERSION)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct WireCreateOrder {
    order_id: String,
    order_amount: f64,
    order_currency: String,
    customer_details: WireCustomerDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_meta: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct WireCustomerDetails {
    customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    order_id: String,
    #[serde(default)]
    order_status: Option<String>,
    #[serde(default)]
    payment_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePaymentAttempt {
    #[serde(default)]
    cf_payment_id: Option<serde_json::Value>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_message: Option<String>,
}

/// The gateway quotes amounts in major units; the ledger stores minor units.
fn to_major_units(amount_minor: i64) -> f64 {
    amount_minor as f64 / 100.0
}

fn attempt_transaction_id(attempt: &WirePaymentAttempt) -> Option<String> {
    match &attempt.cf_payment_id {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/pg/orders", self.config.base_url);

        let body = WireCreateOrder {
            order_id: request.order_id.clone(),
            order_amount: to_major_units(request.amount_minor),
            order_currency: request.currency,
            customer_details: WireCustomerDetails {
                customer_id: request.customer_id.to_string(),
                customer_name: request.customer_details.name,
                customer_email: request.customer_details.email,
                customer_phone: request.customer_details.phone,
            },
            order_meta: request.metadata,
        };

        let response = self
            .authed(self.http_client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::authentication(
                "Gateway rejected API credentials",
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(order_id = %request.order_id, error = %error_text, "Gateway create_order failed");
            return Err(GatewayError::api(format!(
                "Gateway API error ({}): {}",
                status, error_text
            )));
        }

        let order: WireOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::api(format!("Failed to parse gateway response: {}", e)))?;

        Ok(GatewayOrder {
            order_id: order.order_id,
            session_token: order.payment_session_id,
        })
    }

    async fn get_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrderSnapshot>, GatewayError> {
        let url = format!("{}/pg/orders/{}", self.config.base_url, order_id);

        let response = self
            .authed(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(format!(
                "Gateway API error: {}",
                error_text
            )));
        }

        let order: WireOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::api(format!("Failed to parse gateway response: {}", e)))?;

        let order_status = order
            .order_status
            .as_deref()
            .map(GatewayOrderStatus::from_gateway_str)
            .unwrap_or(GatewayOrderStatus::Unknown(String::new()));

        // The latest payment attempt carries the transaction id and, on
        // failure, the gateway's reason. Best-effort: an error here leaves
        // the snapshot without attempt details rather than failing the poll.
        let (transaction_id, failure_reason) =
            match self.latest_payment_attempt(order_id).await {
                Ok(Some(attempt)) => (
                    attempt_transaction_id(&attempt),
                    attempt.payment_message.clone(),
                ),
                Ok(None) => (None, None),
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Failed to fetch payment attempts");
                    (None, None)
                }
            };

        Ok(Some(GatewayOrderSnapshot {
            order_status,
            session_token: order.payment_session_id,
            transaction_id,
            failure_reason,
        }))
    }
}

impl HttpGatewayClient {
    async fn latest_payment_attempt(
        &self,
        order_id: &str,
    ) -> Result<Option<WirePaymentAttempt>, GatewayError> {
        let url = format!("{}/pg/orders/{}/payments", self.config.base_url, order_id);

        let response = self
            .authed(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(format!(
                "Gateway API error: {}",
                error_text
            )));
        }

        let mut attempts: Vec<WirePaymentAttempt> = response
            .json()
            .await
            .map_err(|e| GatewayError::api(format!("Failed to parse gateway response: {}", e)))?;

        // Prefer a successful attempt; otherwise take the most recent one
        let success = attempts
            .iter()
            .position(|a| a.payment_status.as_deref() == Some("SUCCESS"));
        Ok(match success {
            Some(idx) => Some(attempts.swap_remove(idx)),
            None => attempts.into_iter().next(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_minor_units_to_major() {
        assert_eq!(to_major_units(49900), 499.0);
        assert_eq!(to_major_units(50), 0.5);
        assert_eq!(to_major_units(0), 0.0);
    }

    #[test]
    fn extracts_transaction_id_from_string_or_number() {
        let attempt = WirePaymentAttempt {
            cf_payment_id: Some(serde_json::json!("txn_123")),
            payment_status: None,
            payment_message: None,
        };
        assert_eq!(attempt_transaction_id(&attempt), Some("txn_123".to_string()));

        let attempt = WirePaymentAttempt {
            cf_payment_id: Some(serde_json::json!(987654)),
            payment_status: None,
            payment_message: None,
        };
        assert_eq!(attempt_transaction_id(&attempt), Some("987654".to_string()));

        let attempt = WirePaymentAttempt {
            cf_payment_id: Some(serde_json::json!("")),
            payment_status: None,
            payment_message: None,
        };
        assert_eq!(attempt_transaction_id(&attempt), None);
    }

    #[test]
    fn create_order_body_serializes_expected_shape() {
        let body = WireCreateOrder {
            order_id: "order_abc".to_string(),
            order_amount: 499.0,
            order_currency: "INR".to_string(),
            customer_details: WireCustomerDetails {
                customer_id: "user-1".to_string(),
                customer_name: Some("Asha".to_string()),
                customer_email: None,
                customer_phone: None,
            },
            order_meta: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["order_id"], "order_abc");
        assert_eq!(json["order_amount"], 499.0);
        assert_eq!(json["customer_details"]["customer_id"], "user-1");
        assert!(json.get("order_meta").is_none());
        assert!(json["customer_details"].get("customer_email").is_none());
    }
}
