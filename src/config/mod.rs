//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ShutdownConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - A missing file is replaced by the defaults on first start
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_init_config, parse_config, ConfigError, ConfigFormat};
pub use schema::{HookConfig, NoticeConfig, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError, MAX_DURATION_SECONDS};
