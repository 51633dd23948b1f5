//! Default values and constants
//!
//! Shared by the loader, the runtime and `linkctl` so every entry point agrees
//! on file locations and fallbacks.

/// Configuration file locations
pub mod files {
    /// Base configuration, relative to the working directory
    pub const DEFAULT_CONFIG_PATH: &str = "config/linkchain.toml";

    /// Directory, beside the base file, holding `<env>.toml` overlays
    pub const ENVIRONMENTS_DIR: &str = "environments";
}

/// Environment variable overrides
pub mod env {
    /// `LINKCHAIN_GLOBAL__LOG_LEVEL=debug` overrides `global.log_level`
    pub const PREFIX: &str = "LINKCHAIN";

    /// Separates nested keys; single `_` stays part of the key name
    pub const SEPARATOR: &str = "__";
}

/// Logging defaults
pub mod logging {
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// Levels accepted by `global.log_level`
    pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
}

/// Runtime defaults
pub mod runtime {
    /// Actor system name when none is configured
    pub const DEFAULT_SYSTEM_NAME: &str = "linkchain";

    /// How long `linkctl trace` waits for a pipeline to stop (milliseconds)
    pub const TRACE_TIMEOUT_MS: u64 = 5_000;
}
