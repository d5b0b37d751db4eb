//! Configuration management with environment variable support.
//!
//! The only tunable is the number of overwrite passes per shred. It is
//! loaded from a JSON file and/or the environment and handed to each
//! [`crate::shredder::Shredder`] explicitly.
//!
//! ## Environment Variables
//!
//! - `SHREDDER_PASS_COUNT`: Override the number of overwrite passes
//! - `SHREDDER_CONFIG`: Override config file path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable names for configuration overrides
pub const ENV_PASS_COUNT: &str = "SHREDDER_PASS_COUNT";
pub const ENV_CONFIG_PATH: &str = "SHREDDER_CONFIG";

/// Overwrite passes per shred unless configured otherwise
pub const DEFAULT_PASS_COUNT: usize = 3;

/// Above this, each extra pass only adds write amplification
const EXCESSIVE_PASS_COUNT: usize = 35;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pass_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pass_count: DEFAULT_PASS_COUNT,
        }
    }
}

impl Config {
    /// Load config from file path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with environment variable overrides
    /// Priority: ENV vars > config file > defaults
    pub fn load_with_env(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(String::from)
            .or_else(|| env::var(ENV_CONFIG_PATH).ok());

        let mut config = match config_path {
            Some(ref p) if Path::new(p).exists() => {
                info!(path = p, "loading config from file");
                Self::read_file(Path::new(p))?
            }
            _ => {
                debug!("using default configuration");
                Config::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply environment variable overrides to config
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(ENV_PASS_COUNT) {
            self.pass_count = parse_pass_count(&raw)
                .with_context(|| format!("invalid {} value {:?}", ENV_PASS_COUNT, raw))?;
            debug!(pass_count = self.pass_count, "overriding pass_count from environment");
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pass_count == 0 {
            anyhow::bail!("pass_count must be at least 1");
        }

        if self.pass_count > EXCESSIVE_PASS_COUNT {
            warn!(
                pass_count = self.pass_count,
                "pass_count is unusually high - each pass rewrites the whole file"
            );
        }

        Ok(())
    }

    /// Create a new config with explicit values
    pub fn new(pass_count: usize) -> Self {
        Self { pass_count }
    }

    /// Apply an explicit pass count (e.g. a command-line flag), which beats
    /// both the environment and the config file.
    pub fn with_pass_override(mut self, passes: Option<usize>) -> Result<Self> {
        if let Some(n) = passes {
            debug!(pass_count = n, "overriding pass_count explicitly");
            self.pass_count = n;
            self.validate()?;
        }
        Ok(self)
    }
}

fn parse_pass_count(raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .context("expected a non-negative integer")
}
