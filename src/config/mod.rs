//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → config file (TOML, optional)
//!     → environment (PORT, NODE_ENV, LOG_DIR; `.env` fills unset names)
//!     → command-line overrides
//!     → validation.rs (semantic checks)
//!     → EchoConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_dotenv, ConfigError, DotenvStatus, Overrides};
pub use schema::EchoConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
pub use schema::RunMode;
pub use schema::TimeoutConfig;
