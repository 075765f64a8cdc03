//! Scan orchestration for Okapiq.
//!
//! Wires the source adapters, deduplicator, and analytics engine into one
//! fan-out/fan-in pipeline with per-source timeouts, an overall scan
//! deadline, and a TTL cache with single-flight semantics.

pub mod cache;
pub mod error;
pub mod orchestrator;

pub use cache::{scan_cache_key, ScanCache};
pub use error::ScanError;
pub use orchestrator::{Orchestrator, ScanRequest, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
