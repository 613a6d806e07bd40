//! Tiered market-data fetch pipeline.
//!
//! Resolves a logical series request against a chain of sources of
//! increasing cost: authoritative snapshot store, durable TTL cache,
//! rate-limited fallback provider. Concurrent requests for one key are
//! coalesced into a single network operation, and a prefetch scheduler
//! warms the cache ahead of demand without bursting the provider.

pub mod coordinator;
pub mod inflight;
pub mod prefetch;
pub mod series;

pub use coordinator::{FallbackSource, FetchCoordinator};
pub use inflight::InflightRegistry;
pub use prefetch::PrefetchScheduler;
pub use series::{normalize, percent_return, trailing_return};
