//! Payment gateway for checkout operations.
//!
//! This module bridges application checkout actions to the payment backend,
//! with a deterministic offline fallback when no backend is configured.
//!
//! # Architecture
//!
//! ```text
//! checkout call
//!      │
//!      ▼
//! ┌──────────────────┐
//! │ base_url set?    │
//! └────────┬─────────┘
//!          │
//!   ┌──────┴──────┐
//!   │             │
//!  YES            NO
//!   │             │
//!   ▼             ▼
//! POST to      local demo state
//! backend      (in-memory sources)
//! ```
//!
//! The fallback branch exists so the calling application remains fully
//! operable without a configured backend (demo/sandbox mode). In configured
//! mode the remote service is the single source of truth; in fallback mode
//! the gateway instance is.

mod customer;
mod gateway;

pub use customer::{Card, Customer};
pub use gateway::{PaymentGateway, DEMO_CUSTOMER_ID};

pub use crate::config::GatewayConfig;
