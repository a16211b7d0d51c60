//! Inbound webhook surface
//!
//! - **guard**: HMAC-SHA256 signature verification over the raw body
//! - **server**: axum router mapping deliveries onto the sync engine

pub mod guard;
pub mod server;

pub use guard::{sign, verify, SignatureGuard, SIGNATURE_HEADER};
pub use server::{status_for, WebhookServer, DELIVERY_HEADER, EVENT_HEADER};
