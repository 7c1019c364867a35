//! Mock payment gateway for development and testing.
//!
//! A configurable in-memory implementation of `GatewayClient`. Supports:
//! - Pre-configured order snapshots
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::commerce::GatewayOrderStatus;
use crate::ports::{
    CreateOrderRequest, GatewayClient, GatewayError, GatewayOrder, GatewayOrderSnapshot,
};

/// Mock payment gateway.
///
/// Created orders start ACTIVE with a synthetic session token. Tests can
/// overwrite any order's snapshot to drive status transitions.
#[derive(Default)]
pub struct MockGatewayClient {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    orders: HashMap<String, GatewayOrderSnapshot>,
    next_error: Option<GatewayError>,
    created_orders: Vec<CreateOrderRequest>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite an order's snapshot.
    pub fn set_snapshot(&self, order_id: impl Into<String>, snapshot: GatewayOrderSnapshot) {
        self.inner
            .lock()
            .unwrap()
            .orders
            .insert(order_id.into(), snapshot);
    }

    /// Mark an order as paid with the given transaction id.
    pub fn settle_order(&self, order_id: &str, transaction_id: impl Into<String>) {
        self.set_snapshot(
            order_id,
            GatewayOrderSnapshot {
                order_status: GatewayOrderStatus::Paid,
                session_token: None,
                transaction_id: Some(transaction_id.into()),
                failure_reason: None,
            },
        );
    }

    /// Fail the next call with the given error.
    pub fn set_error(&self, error: GatewayError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Orders created so far, for assertions.
    pub fn created_orders(&self) -> Vec<CreateOrderRequest> {
        self.inner.lock().unwrap().created_orders.clone()
    }

    fn take_error(&self) -> Option<GatewayError> {
        self.inner.lock().unwrap().next_error.take()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        let order_id = request.order_id.clone();
        let session_token = format!("session_{}", order_id);

        let mut state = self.inner.lock().unwrap();
        state.orders.insert(
            order_id.clone(),
            GatewayOrderSnapshot {
                order_status: GatewayOrderStatus::Active,
                session_token: Some(session_token.clone()),
                transaction_id: None,
                failure_reason: None,
            },
        );
        state.created_orders.push(request);

        Ok(GatewayOrder {
            order_id,
            session_token: Some(session_token),
        })
    }

    async fn get_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrderSnapshot>, GatewayError> {
        if let Some(error) = self.take_error() {
            return Err(error);
        }

        Ok(self.inner.lock().unwrap().orders.get(order_id).cloned())
    }
}
