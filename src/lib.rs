//! Tether tools - main library
//!
//! Re-exports the workspace libraries and hosts the plumbing shared by the
//! binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: CLI helpers, settings, logging and the runner trait
//! - **tether**: persistent WebSocket client (re-exported from workspace)
//! - **tether_http**: HTTP helper with lifecycle hooks (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use tether_tools::bin_common::{load_config_from_env, ConfigType, TailSettings};
//! ```

// Re-export workspace libraries for convenience
pub use tether;
pub use tether_http;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod ping;
    pub mod runner;
    pub mod settings;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use logging::init_tracing;
    pub use ping::{pong_reply, PingReplier};
    pub use runner::{BinaryRunner, RunConfig, StopReason};
    pub use settings::{HeaderSetting, SettingsError, TailSettings};
}
