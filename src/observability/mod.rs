//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (owner, wallet, transport) instead of formatted strings
//! - Request ID is attached to every admin API span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
