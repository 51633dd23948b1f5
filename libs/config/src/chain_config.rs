//! Chain Configuration Module
//!
//! Loads the state-id assignments of a deployment: which actor answers for
//! which state id, which broadcast channels it listens on, and global runtime
//! settings. Supports loading from TOML files with environment-specific
//! overrides.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use linkchain_codec::{LinkTarget, StateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main chain configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ChainConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// State assignments keyed by state name
    #[serde(default)]
    pub states: BTreeMap<String, StateSettings>,

    /// Listen registrations keyed by channel name
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelSettings>,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub json_logs: bool,
    /// Link target for every hop that does not pick its own
    pub link_target: LinkTarget,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::logging::DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
            link_target: LinkTarget::default(),
        }
    }
}

/// One state id and the actor that answers for it
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StateSettings {
    /// Raw id; zero is rejected by [`ChainConfig::validate`]
    pub id: i32,
    pub actor: String,
    pub description: Option<String>,
}

/// One broadcast channel an actor listens on
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub channel: i32,
    pub actor: String,
    pub description: Option<String>,
}

/// Validated view of a [`ChainConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateAssignments {
    /// State id to state name
    pub states: BTreeMap<StateId, String>,
    /// Actor name to the ids it owns, ascending
    pub actors: BTreeMap<String, Vec<StateId>>,
    /// Actor name to the channels it listens on, ascending
    pub channels: BTreeMap<String, Vec<i32>>,
}

impl StateAssignments {
    /// Ids owned by `actor`
    pub fn states_of(&self, actor: &str) -> &[StateId] {
        self.actors.get(actor).map(Vec::as_slice).unwrap_or_default()
    }

    /// Channels `actor` listens on
    pub fn channels_of(&self, actor: &str) -> &[i32] {
        self.channels.get(actor).map(Vec::as_slice).unwrap_or_default()
    }

    /// Name of the state with id `id`
    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.states.get(&id).map(String::as_str)
    }
}

impl ChainConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, defaults::env::PREFIX)
    }

    /// Like [`ChainConfig::load`], reading overrides from `<prefix>_...`
    /// environment variables
    pub fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_prefix: &str,
    ) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(defaults::files::DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = environment_file(base, env);
            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator(defaults::env::SEPARATOR)
                .try_parsing(true),
        );

        let config = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {:?}", base))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Parse a TOML document without file or environment sources
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Check the namespace and build the per-actor assignments
    ///
    /// Rejects a zero id, an id used by two states, a listen channel whose
    /// actor owns no state, and an unknown log level.
    pub fn validate(&self) -> Result<StateAssignments> {
        if !defaults::logging::LOG_LEVELS.contains(&self.global.log_level.as_str()) {
            bail!(
                "Unknown log level '{}' (expected one of {:?})",
                self.global.log_level,
                defaults::logging::LOG_LEVELS
            );
        }

        let mut assignments = StateAssignments::default();

        for (name, state) in &self.states {
            let Some(id) = StateId::new(state.id) else {
                bail!("State '{}' uses id 0, which is reserved for the terminal hop", name);
            };
            if state.actor.trim().is_empty() {
                bail!("State '{}' has no actor", name);
            }
            if let Some(existing) = assignments.states.insert(id, name.clone()) {
                bail!("States '{}' and '{}' both use id {}", existing, name, id);
            }
            assignments
                .actors
                .entry(state.actor.clone())
                .or_default()
                .push(id);
        }

        for (name, channel) in &self.channels {
            if !assignments.actors.contains_key(&channel.actor) {
                bail!(
                    "Channel '{}' is assigned to actor '{}', which owns no state",
                    name,
                    channel.actor
                );
            }
            let listening = assignments
                .channels
                .entry(channel.actor.clone())
                .or_default();
            if listening.contains(&channel.channel) {
                debug!(channel = channel.channel, actor = %channel.actor, "Duplicate listen registration ignored");
                continue;
            }
            listening.push(channel.channel);
        }

        for ids in assignments.actors.values_mut() {
            ids.sort();
        }
        for channels in assignments.channels.values_mut() {
            channels.sort();
        }

        debug!(
            states = assignments.states.len(),
            actors = assignments.actors.len(),
            "Configuration validated"
        );
        Ok(assignments)
    }

    /// Id of the state called `name`
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.get(name).and_then(|s| StateId::new(s.id))
    }
}

/// `<base dir>/environments/<env>.toml`
fn environment_file(base: &Path, environment: &str) -> PathBuf {
    base.parent()
        .unwrap_or(Path::new("."))
        .join(defaults::files::ENVIRONMENTS_DIR)
        .join(format!("{}.toml", environment))
}

/// Convenience function to load and validate configuration from the default
/// path
pub fn load_config(environment: Option<&str>) -> Result<ChainConfig> {
    let config = ChainConfig::load(None, environment)?;
    config.validate()?;
    Ok(config)
}
