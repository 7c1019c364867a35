//! Adapters layer - Infrastructure implementations of the ports.
//!
//! - `postgres` - Database-backed repositories
//! - `gateway` - Payment gateway clients (HTTP and mock)
//! - `http` - Axum REST API

pub mod gateway;
pub mod http;
pub mod postgres;
