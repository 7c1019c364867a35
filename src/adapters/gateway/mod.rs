//! Payment gateway adapters.
//!
//! - `HttpGatewayClient` - Production adapter against the gateway REST API
//! - `MockGatewayClient` - Configurable in-memory gateway for development and tests

mod http_client;
mod mock;

pub use http_client::{HttpGatewayClient, HttpGatewayConfig};
pub use mock::MockGatewayClient;
