//! Simulator configuration.
//!
//! Every section and field has a default, so an empty TOML document (or no
//! file at all) yields the reference machine: 256-line caches, a 2^20-word
//! memory and a 64-cycle memory latency.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;
use crate::common::constants::{DEFAULT_CACHE_LINES, DEFAULT_MEM_LATENCY, DEFAULT_MEM_WORDS};

/// Run-loop controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Abort with an error once this many cycles have elapsed.
    pub max_cycles: Option<u64>,
    /// Emit a per-cycle pipeline diagram at `trace` log level.
    pub trace_pipeline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lines per private cache. Must be a power of two.
    pub lines: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lines: DEFAULT_CACHE_LINES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory size in words. Must be a power of two.
    pub size_words: usize,
    /// Cycles from issue to completion of one memory operation.
    pub latency: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_words: DEFAULT_MEM_WORDS,
            latency: DEFAULT_MEM_LATENCY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Collect bus trace entries for later output.
    pub trace: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub cache: CacheConfig,
    pub memory: MemoryConfig,
    pub bus: BusConfig,
}

impl Config {
    /// Parses a TOML document and validates the result.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Checks the structural constraints the cache and memory rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cache.lines.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "cache.lines must be a power of two, got {}",
                self.cache.lines
            )));
        }
        if !self.memory.size_words.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "memory.size_words must be a power of two, got {}",
                self.memory.size_words
            )));
        }
        if self.memory.size_words > u32::MAX as usize {
            return Err(ConfigError::Invalid(
                "memory.size_words must fit a 32-bit address".to_string(),
            ));
        }
        if self.memory.size_words < self.cache.lines {
            return Err(ConfigError::Invalid(format!(
                "memory ({} words) smaller than a cache ({} lines)",
                self.memory.size_words, self.cache.lines
            )));
        }
        if self.memory.latency == 0 {
            return Err(ConfigError::Invalid(
                "memory.latency must be at least 1 cycle".to_string(),
            ));
        }
        Ok(())
    }
}
