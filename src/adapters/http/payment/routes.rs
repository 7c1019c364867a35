//! Axum router configuration for payment endpoints.
//!
//! This module defines the route structure for payment-related API endpoints
//! and wires them to their corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_order, create_order, get_my_subscriptions, get_order_status, get_payment_history,
    handle_webhook, resume_order, PaymentAppState,
};

/// Create the payment API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /create-order` - Start a purchase (invoice + gateway order)
/// - `POST /resume` - Resume an unfinished order
/// - `POST /cancel` - Cancel an unfinished order
/// - `GET /order/:order_id` - Resolve an order's merged status
/// - `GET /history` - Payment history for the current user
/// - `GET /my-subscriptions` - Active subscriptions for the current user
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new()
        .route("/create-order", post(create_order))
        .route("/resume", post(resume_order))
        .route("/cancel", post(cancel_order))
        .route("/order/:order_id", get(get_order_status))
        .route("/history", get(get_payment_history))
        .route("/my-subscriptions", get(get_my_subscriptions))
}

/// Create the gateway webhook router.
///
/// This is separate from the main payment routes because webhooks don't
/// require user authentication (they're verified via signature).
///
/// # Routes
/// - `POST /payment` - Handle gateway webhooks
pub fn webhook_routes() -> Router<PaymentAppState> {
    Router::new().route("/payment", post(handle_webhook))
}

/// Create the complete payment module router.
///
/// Combines user routes and webhook routes into a single router suitable
/// for mounting at `/api`.
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .nest("/payment", payment_routes())
        .nest("/webhooks", webhook_routes())
}
