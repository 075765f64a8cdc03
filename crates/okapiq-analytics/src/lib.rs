//! Market analytics for Okapiq.
//!
//! Pure, deterministic computation over merged business records: the
//! deduplicator turns raw listings into canonical [`okapiq_core::BusinessRecord`]s,
//! and the engine annotates them with TAM/TSM sizing, concentration,
//! succession risk, digital presence, and lead scores. No I/O happens in
//! this crate; the scan orchestrator feeds it and consumes its output.

pub mod dedupe;
pub mod digital;
pub mod engine;
pub mod hhi;
pub mod succession;
pub mod tam;

pub use dedupe::{merge, SourcePrecedence};
pub use engine::{aggregate, annotate, resolve_profile};
pub use succession::{succession_risk, SuccessionRisk, DEFAULT_BUSINESS_AGE_YEARS};
