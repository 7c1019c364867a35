//! HTTP adapter for payment endpoints.
//!
//! Exposes the commerce domain via REST API:
//! - `POST /api/payment/create-order` - Start a purchase
//! - `POST /api/payment/resume` - Resume an unfinished order
//! - `POST /api/payment/cancel` - Cancel an unfinished order
//! - `GET /api/payment/order/:order_id` - Resolve an order's merged status
//! - `GET /api/payment/history` - Payment history for the current user
//! - `GET /api/payment/my-subscriptions` - Active subscriptions
//! - `POST /api/webhooks/payment` - Handle gateway webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{AuthenticatedUser, PaymentApiError, PaymentAppState};
pub use routes::{payment_router, payment_routes, webhook_routes};
