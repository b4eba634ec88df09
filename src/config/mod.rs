//! Service configuration subsystem.
//!
//! # Data Flow
//! ```text
//! router.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Service settings are immutable once loaded; the routing document is the
//!   only state that changes at runtime, and it lives in `routing`
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AdminConfig, DispatchConfig, ListenerConfig, ObservabilityConfig, RelayerConfig, ServiceConfig,
    StoreConfig,
};
