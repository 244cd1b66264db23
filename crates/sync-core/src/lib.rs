pub mod cache;
pub mod clock;
pub mod collection;
pub mod enrich;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod state;
