//! # Linkchain Configuration
//!
//! State-id assignments for a deployment. Independently written actors only
//! cooperate if their state ids are disjoint, so the namespace lives in one
//! file that every entry point loads and validates.
//!
//! ## Usage
//!
//! ```rust
//! use linkchain_config::ChainConfig;
//!
//! let config = ChainConfig::from_toml_str(
//!     r#"
//! [states.fetch]
//! id = 10
//! actor = "fetcher"
//! "#,
//! )
//! .unwrap();
//! let assignments = config.validate().unwrap();
//! assert_eq!(assignments.states_of("fetcher").len(), 1);
//! ```

pub mod chain_config;
pub mod defaults;

pub use chain_config::{
    load_config, ChainConfig, ChannelSettings, GlobalConfig, StateAssignments, StateSettings,
};
