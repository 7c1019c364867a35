//! Inbound gateway webhook envelope and event normalization.
//!
//! These types sit at the transport boundary. The envelope carries both the
//! framework-parsed body and the raw bytes, so normalization can fall back to
//! one re-parse of the raw payload when the parsed body arrived empty.

use serde_json::Value;

/// Event types this system acts on. Everything else is acknowledged and
/// ignored, since gateway delivery is at-least-once and may include types
/// outside this subsystem's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    PaymentSuccess,
    PaymentFailed,
    /// The gateway's connectivity test; carries no real order.
    Test,
    Unknown(String),
}

impl WebhookEventType {
    pub fn from_event_str(s: &str) -> Self {
        match s {
            "PAYMENT_SUCCESS_WEBHOOK" | "PAYMENT_SUCCESS" => WebhookEventType::PaymentSuccess,
            "PAYMENT_FAILED_WEBHOOK" | "PAYMENT_FAILED" => WebhookEventType::PaymentFailed,
            "WEBHOOK" | "TEST" => WebhookEventType::Test,
            other => WebhookEventType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WebhookEventType::PaymentSuccess => "PAYMENT_SUCCESS",
            WebhookEventType::PaymentFailed => "PAYMENT_FAILED",
            WebhookEventType::Test => "TEST",
            WebhookEventType::Unknown(s) => s.as_str(),
        }
    }
}

/// The webhook exactly as it crossed the wire: signature headers plus body in
/// both parsed and raw form.
#[derive(Debug, Clone)]
pub struct RawWebhookEnvelope {
    pub signature: Option<String>,
    pub timestamp: Option<String>,
    /// Body as parsed by the HTTP layer; may be absent or empty depending on
    /// how the transport delivered it.
    pub parsed_body: Option<Value>,
    pub raw_body: Vec<u8>,
}

impl RawWebhookEnvelope {
    /// The exact bytes the signature was computed over.
    pub fn raw_body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_body)
    }
}

/// A normalized gateway event, extracted from whichever body form survived
/// transport.
#[derive(Debug, Clone)]
pub struct GatewayWebhookEvent {
    pub event_type: WebhookEventType,
    /// The gateway order id, equal to the payment_reference this system
    /// minted at order creation.
    pub order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    /// The gateway's nested payment-method object, normalized downstream.
    pub payment_method: Option<Value>,
    pub failure_reason: Option<String>,
    pub payload: Value,
}

impl GatewayWebhookEvent {
    /// Normalizes an envelope into an event.
    ///
    /// Performs at most one deserialization of the raw bytes, and only when
    /// the parsed body is missing or empty. Returns `None` when no usable
    /// JSON body exists in either form.
    pub fn from_envelope(envelope: &RawWebhookEnvelope) -> Option<Self> {
        let body = match &envelope.parsed_body {
            Some(v) if !v.is_null() && v.as_object().map_or(true, |o| !o.is_empty()) => v.clone(),
            _ => serde_json::from_slice::<Value>(&envelope.raw_body).ok()?,
        };

        let event_type = body
            .get("type")
            .and_then(Value::as_str)
            .map(WebhookEventType::from_event_str)
            .unwrap_or(WebhookEventType::Unknown("MISSING_TYPE".to_string()));

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let order = data.get("order").cloned().unwrap_or(Value::Null);
        let payment = data.get("payment").cloned().unwrap_or(Value::Null);

        let order_id = order
            .get("order_id")
            .or_else(|| order.get("orderId"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let gateway_payment_id = payment
            .get("cf_payment_id")
            .or_else(|| payment.get("payment_id"))
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty());

        let payment_method = payment.get("payment_method").cloned().filter(|v| !v.is_null());

        let failure_reason = payment
            .get("payment_message")
            .or_else(|| payment.get("error_details"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            event_type,
            order_id,
            gateway_payment_id,
            payment_method,
            failure_reason,
            payload: body,
        })
    }

    /// Connectivity test events carry no real order and must be acknowledged
    /// without touching ledger state.
    pub fn is_test_event(&self) -> bool {
        self.event_type == WebhookEventType::Test
            || (self.order_id.is_none() && matches!(self.event_type, WebhookEventType::Unknown(_)))
    }
}
