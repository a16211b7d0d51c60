//! gh2yt - GitHub to YouTrack issue mirror
//!
//! Provisions a YouTrack project for a GitHub repository, imports the existing
//! issues once, and then keeps each issue in sync from GitHub webhook
//! deliveries.
//!
//! # Architecture
//!
//! - **model**: Source (GitHub) and destination (YouTrack) issue shapes
//! - **config**: Explicit sync configuration (YAML file + environment)
//! - **integrations**: Tracker transports (GitHub REST, YouTrack REST) behind traits
//! - **sync**: Correlation lookup, provisioning, translation and the sync decision engine
//! - **webhook**: Signature guard and the axum webhook server

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod model;
pub mod sync;
pub mod webhook;

// Re-exports
pub use error::{Result, SyncError};
