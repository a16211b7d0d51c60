//! Sync core
//!
//! - **correlation**: find linked issues and projects on the destination
//! - **provisioning**: idempotent project and correlation field setup
//! - **translator**: GitHub issue → YouTrack payload mapping
//! - **engine**: create-or-update decision per issue, bulk import
//! - **bootstrap**: webhook registration and one-time import

pub mod bootstrap;
pub mod correlation;
pub mod engine;
pub mod locks;
pub mod provisioning;
pub mod report;
pub mod translator;

#[cfg(test)]
pub(crate) mod testing;

pub use bootstrap::{Bootstrap, BootstrapSummary, ImportOutcome, WebhookRegistration};
pub use correlation::CorrelationStore;
pub use engine::{SyncEngine, SyncOutcome};
pub use locks::SourceLocks;
pub use provisioning::Provisioner;
pub use report::{ImportFailure, ImportReport, ImportedIssue};
pub use translator::{IssueTranslator, DEFAULT_DESCRIPTION};
