//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::commerce::{
    CancelOrderCommand, CancelOrderHandler, GetPaymentHistoryCommand, GetPaymentHistoryHandler,
    GrantSubscriptionHandler, ListSubscriptionsCommand, ListSubscriptionsHandler,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult, ResolveOrderCommand,
    ResolveOrderHandler, ResumeOrderCommand, ResumeOrderHandler, ResumeOrderResult,
    StartPurchaseCommand, StartPurchaseHandler,
};
use crate::domain::commerce::{CommerceError, RawWebhookEnvelope, WebhookVerifier};
use crate::domain::foundation::{OrgId, PricingPlanId, UserId};
use crate::ports::{
    CatalogReader, CustomerDetails, GatewayClient, InvoiceLedger, PaymentRepository,
    SubscriptionRepository,
};

use super::dto::{
    CancelOrderRequestDto, CancelOrderResponse, CreateOrderRequestDto, CreateOrderResponse,
    ErrorResponse, OrderStatusResponse, PaymentHistoryResponse, ResumeOrderRequestDto,
    ResumeOrderResponse, SubscriptionResponse, SubscriptionsResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct PaymentAppState {
    pub catalog: Arc<dyn CatalogReader>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub ledger: Arc<dyn InvoiceLedger>,
    pub payments: Arc<dyn PaymentRepository>,
    pub gateway: Arc<dyn GatewayClient>,
    pub webhook_verifier: Arc<WebhookVerifier>,
    pub default_currency: String,
}

impl PaymentAppState {
    /// Create handlers on demand from the shared state.
    pub fn start_purchase_handler(&self) -> StartPurchaseHandler {
        StartPurchaseHandler::new(
            self.catalog.clone(),
            self.subscriptions.clone(),
            self.ledger.clone(),
            self.payments.clone(),
            self.gateway.clone(),
        )
    }

    pub fn grant_subscription_handler(&self) -> Arc<GrantSubscriptionHandler> {
        Arc::new(GrantSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.catalog.clone(),
        ))
    }

    pub fn process_webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.payments.clone(),
            self.ledger.clone(),
            self.grant_subscription_handler(),
        )
    }

    pub fn resolve_order_handler(&self) -> ResolveOrderHandler {
        ResolveOrderHandler::new(
            self.payments.clone(),
            self.ledger.clone(),
            self.gateway.clone(),
        )
    }

    pub fn resume_order_handler(&self) -> ResumeOrderHandler {
        ResumeOrderHandler::new(
            self.payments.clone(),
            self.ledger.clone(),
            self.gateway.clone(),
            self.grant_subscription_handler(),
        )
    }

    pub fn cancel_order_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler::new(self.payments.clone(), self.ledger.clone())
    }

    pub fn payment_history_handler(&self) -> GetPaymentHistoryHandler {
        GetPaymentHistoryHandler::new(self.ledger.clone(), self.payments.clone())
    }

    pub fn list_subscriptions_handler(&self) -> ListSubscriptionsHandler {
        ListSubscriptionsHandler::new(self.subscriptions.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from request.
///
/// In production, this would be extracted from JWT/session by auth middleware.
/// For now, uses a header-based extraction for development/testing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub org_id: Option<OrgId>,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // In production, this would validate JWT token from Authorization header
            // For development, we accept an X-User-Id header
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<UserId>().ok())
                .ok_or(AuthenticationRequired)?;

            let org_id = parts
                .headers
                .get("X-Org-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<OrgId>().ok());

            Ok(AuthenticatedUser { user_id, org_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payment/create-order - Start a purchase
pub async fn create_order(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequestDto>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let pricing_plan_id = request
        .pricing_plan_id
        .parse::<PricingPlanId>()
        .map_err(|_| CommerceError::validation("pricing_plan_id", "Not a valid plan id"))?;
    let org_id = match request.org_id {
        Some(raw) => Some(
            raw.parse::<OrgId>()
                .map_err(|_| CommerceError::validation("org_id", "Not a valid org id"))?,
        ),
        None => user.org_id,
    };

    let handler = state.start_purchase_handler();
    let cmd = StartPurchaseCommand {
        user_id: user.user_id,
        org_id,
        pricing_plan_id,
        customer: CustomerDetails {
            name: request.customer_name,
            email: request.customer_email,
            phone: request.customer_phone,
        },
        currency: request
            .currency
            .unwrap_or_else(|| state.default_currency.clone()),
    };

    let result = handler.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse::from(result))))
}

/// POST /api/payment/webhook - Handle gateway webhook events
///
/// Signature failures map to 401 and correlation failures to 400 so the
/// gateway retries them; any other processing failure is logged and
/// acknowledged with 200 to stop redelivery of a payload that will never
/// process differently.
pub async fn handle_webhook(
    State(state): State<PaymentAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let timestamp = headers
        .get("x-webhook-timestamp")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let handler = state.process_webhook_handler();
    let cmd = ProcessWebhookCommand {
        envelope: RawWebhookEnvelope {
            signature,
            timestamp,
            parsed_body: None,
            raw_body: body.to_vec(),
        },
    };

    match handler.handle(cmd).await {
        Ok(result) => {
            match &result {
                ProcessWebhookResult::PaymentRecorded {
                    invoice_id,
                    newly_granted,
                    ..
                } => {
                    tracing::info!(invoice_id = %invoice_id, newly_granted, "Webhook payment recorded");
                }
                ProcessWebhookResult::PaymentFailed { invoice_id } => {
                    tracing::info!(invoice_id = %invoice_id, "Webhook payment failure recorded");
                }
                ProcessWebhookResult::Acknowledged | ProcessWebhookResult::Ignored => {}
            }
            StatusCode::OK.into_response()
        }
        Err(err @ CommerceError::InvalidSignature(_)) => PaymentApiError(err).into_response(),
        Err(err @ CommerceError::MissingOrderCorrelation(_)) => {
            PaymentApiError(err).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Webhook processing failed; acknowledging to stop retries");
            StatusCode::OK.into_response()
        }
    }
}

/// POST /api/payment/resume - Resume an unfinished order
pub async fn resume_order(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Json(request): Json<ResumeOrderRequestDto>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.resume_order_handler();
    let cmd = ResumeOrderCommand {
        order_id: request.order_id,
        user_id: user.user_id,
        customer: CustomerDetails {
            name: request.customer_name,
            email: request.customer_email,
            phone: request.customer_phone,
        },
    };

    let result = handler.handle(cmd).await?;

    let response = match result {
        ResumeOrderResult::AlreadyPaid => ResumeOrderResponse {
            outcome: "already_paid",
            order_id: None,
            payment_session_id: None,
        },
        ResumeOrderResult::ReuseSession {
            order_id,
            gateway_session_token,
        } => ResumeOrderResponse {
            outcome: "reuse_session",
            order_id: Some(order_id),
            payment_session_id: gateway_session_token,
        },
        ResumeOrderResult::NewOrder {
            order_id,
            gateway_session_token,
        } => ResumeOrderResponse {
            outcome: "new_order",
            order_id: Some(order_id),
            payment_session_id: gateway_session_token,
        },
    };

    Ok(Json(response))
}

/// POST /api/payment/cancel - Cancel an unfinished order
pub async fn cancel_order(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CancelOrderRequestDto>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.cancel_order_handler();
    let cmd = CancelOrderCommand {
        order_id: request.order_id,
        user_id: user.user_id,
        reason: request.reason,
    };

    handler.handle(cmd).await?;

    Ok(Json(CancelOrderResponse { cancelled: true }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payment/order/:order_id - Resolve an order's merged status
pub async fn get_order_status(
    State(state): State<PaymentAppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.resolve_order_handler();
    let result = handler.handle(ResolveOrderCommand { order_id }).await?;

    Ok(Json(OrderStatusResponse::from(result)))
}

/// GET /api/payment/history - Get current user's payment history
pub async fn get_payment_history(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.payment_history_handler();
    let result = handler
        .handle(GetPaymentHistoryCommand {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(PaymentHistoryResponse::from(result)))
}

/// GET /api/payment/my-subscriptions - Get current user's active subscriptions
pub async fn get_my_subscriptions(
    State(state): State<PaymentAppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.list_subscriptions_handler();
    let result = handler
        .handle(ListSubscriptionsCommand {
            user_id: user.user_id,
        })
        .await?;

    let response = SubscriptionsResponse {
        subscriptions: result
            .subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct PaymentApiError(CommerceError);

impl From<CommerceError> for PaymentApiError {
    fn from(err: CommerceError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::DomainError> for PaymentApiError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        Self(CommerceError::from(err))
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            CommerceError::PricingPlanNotFound(_)
            | CommerceError::OrderNotFound(_)
            | CommerceError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
            CommerceError::AlreadySubscribed(_) | CommerceError::InvalidState { .. } => {
                StatusCode::CONFLICT
            }
            CommerceError::Forbidden => StatusCode::FORBIDDEN,
            CommerceError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            CommerceError::MissingOrderCorrelation(_)
            | CommerceError::InvalidScope(_)
            | CommerceError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            CommerceError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            CommerceError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Use the error's built-in message() method for consistent messaging
        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
