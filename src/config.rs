//! Configuration loading.
//!
//! `defaults/rangecheck.default.toml` is embedded into the crate so docs and
//! runtime behavior stay in sync. Callers layer their own files and key
//! overrides on top via [`Loader`] before deserializing into
//! [`OracleConfig`].

use std::path::Path;

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::File;
use config::FileFormat;
use config::ValueKind;
use serde::Deserialize;

use crate::error::Error;
use crate::error::Result;

/// No random sub-range fits between the document edges below this length.
pub const MIN_RANDOM_LENGTH: usize = 8;

const DEFAULT_TOML: &str = include_str!("../defaults/rangecheck.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    pub factory: FactoryConfig,
    pub movement: MovementConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Range factory knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct FactoryConfig {
    /// Seed for random sub-ranges; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Shortest document that can host a random sub-range. Never below
    /// [`MIN_RANDOM_LENGTH`].
    pub min_random_length: usize,
}

impl FactoryConfig {
    /// The configured minimum, raised to [`MIN_RANDOM_LENGTH`].
    pub fn random_length_floor(&self) -> usize {
        return self.min_random_length.max(MIN_RANDOM_LENGTH);
    }
}

/// Movement oracle knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct MovementConfig {
    pub max_walk_steps: usize,
    pub saturation_probes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `"info"` or `"rangecheck=debug"`.
    pub filter: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        return OracleConfig {
            factory: FactoryConfig {
                seed: None,
                min_random_length: MIN_RANDOM_LENGTH,
            },
            movement: MovementConfig {
                max_walk_steps: 100_000,
                saturation_probes: 1,
            },
            session: SessionConfig { cache_capacity: 16 },
            logging: LoggingConfig {
                filter: "info".to_string(),
            },
        };
    }
}

/// Layers user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        return Loader { builder };
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref()).format(FileFormat::Toml).required(true);
        self.builder = self.builder.add_source(source);
        return self;
    }

    /// Layer an optional configuration file (ignored if absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref()).format(FileFormat::Toml).required(false);
        self.builder = self.builder.add_source(source);
        return self;
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        return Ok(self);
    }

    /// Finalize and deserialize.
    pub fn build(self) -> Result<OracleConfig> {
        let config: OracleConfig = self.builder.build()?.try_deserialize()?;
        if config.factory.min_random_length < MIN_RANDOM_LENGTH {
            return Err(Error::configuration(format!(
                "factory.min_random_length = {} is below {MIN_RANDOM_LENGTH}",
                config.factory.min_random_length
            )));
        }
        return Ok(config);
    }
}

impl Default for Loader {
    fn default() -> Self {
        return Self::new();
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<OracleConfig> {
    return Loader::new().build();
}
