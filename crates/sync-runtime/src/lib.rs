pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;

#[cfg(test)]
mod tests;

pub use builder::{Fetchers, SyncBuilder};
pub use config::{EnricherSettings, EnrichmentPolicy, SyncSettings};
pub use context::SyncContext;
pub use error::{SyncError, SyncStage};
pub use orchestrator::{EnrichmentFailure, SyncOrchestrator, SyncOutcome};
