//! Tracker configuration and builder.

use std::collections::BTreeMap;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Configuration for a tracker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Rollup instance id; bound into every proposal partial hash.
    #[serde(default)]
    pub instance_id: B256,
    /// Capacity of the query mailbox. Ingestion has its own unbounded channel.
    #[serde(default = "default_query_buffer")]
    pub query_buffer: usize,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_query_buffer() -> usize {
    256
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            instance_id: B256::ZERO,
            query_buffer: default_query_buffer(),
            log: LogConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrackerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.query_buffer == 0 {
            return Err(TrackerError::Config("queryBuffer must be at least 1".into()));
        }
        Ok(())
    }
}

/// Tracing output for the tracker and the CLI.
///
/// Turned into an `EnvFilter` by the binary; `RUST_LOG` still wins when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for every target without an override, e.g. `"info"`.
    pub level: String,
    /// Per-crate overrides such as `"chaintrack-core": "debug"`. Dashes are
    /// accepted and mapped to the underscored target name.
    pub targets: BTreeMap<String, String>,
    /// One JSON object per event instead of the compact text format.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".into(), targets: BTreeMap::new(), json: false }
    }
}

impl LogConfig {
    /// `EnvFilter` directive string, e.g. `"info,chaintrack_core=debug"`.
    pub fn directives(&self) -> String {
        self.targets.iter().fold(self.level.clone(), |mut acc, (target, level)| {
            acc.push_str(&format!(",{}={}", target.replace('-', "_"), level));
            acc
        })
    }
}

/// Fluent builder for [`TrackerConfig`].
#[derive(Debug, Default)]
pub struct TrackerBuilder {
    config: TrackerConfig,
}

impl TrackerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_id(mut self, id: B256) -> Self {
        self.config.instance_id = id;
        self
    }

    pub fn query_buffer(mut self, capacity: usize) -> Self {
        self.config.query_buffer = capacity;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log.level = level.into();
        self
    }

    pub fn json_logs(mut self, json: bool) -> Self {
        self.config.log.json = json;
        self
    }

    pub fn build_config(self) -> Result<TrackerConfig, TrackerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
