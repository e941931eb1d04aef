//! TOML configuration for `ferryctl`.
//!
//! Every section is optional; a missing file section falls back to its
//! defaults, and command-line flags override whatever the file says.

use std::num::NonZeroU32;
use std::path::Path;

use anyhow::{Context, bail};
use ferry_ring::{Blake3Hasher, DEFAULT_REPLICAS, RingConfig};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Ring membership and placement.
    pub ring: RingSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[ring]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Active buckets.
    pub buckets: Vec<String>,
    /// Virtual nodes per bucket. Defaults to 160.
    pub replicas: Option<u32>,
    /// Placement seed. Unset means the unkeyed BLAKE3 hasher.
    ///
    /// Routers that must agree on placement need the same seed.
    pub seed: Option<String>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("reading {}", p.display()))?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective virtual nodes per bucket.
    ///
    /// Zero is rejected: a bucket with no virtual nodes could never be routed to.
    pub fn replicas(&self) -> anyhow::Result<NonZeroU32> {
        match self.ring.replicas {
            None => Ok(DEFAULT_REPLICAS),
            Some(n) => match NonZeroU32::new(n) {
                Some(n) => Ok(n),
                None => bail!("ring.replicas must be at least 1"),
            },
        }
    }

    /// Ring parameters derived from this config.
    pub fn ring_config(&self) -> anyhow::Result<RingConfig> {
        Ok(RingConfig::new(self.replicas()?))
    }

    /// Placement hasher derived from this config.
    pub fn hasher(&self) -> Blake3Hasher {
        match self.ring.seed.as_deref() {
            Some(seed) => Blake3Hasher::seeded(seed),
            None => Blake3Hasher::new(),
        }
    }
}
