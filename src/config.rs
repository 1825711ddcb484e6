use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::KeyScheme;

const DEFAULT_LINE_TOLERANCE: f64 = 0.5;
const DEFAULT_TOP_N: usize = 5;

/// Which rule turns a merged row into a best bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrategy {
    /// Compare the over and under probabilities of a two-sided book, falling
    /// back to a single-price book.
    #[default]
    TwoSided,
    /// Take the most lopsided price among every usable quote.
    Magnitude,
}

impl FromStr for EdgeStrategy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "two_sided" | "twosided" | "two-sided" => Ok(Self::TwoSided),
            "magnitude" => Ok(Self::Magnitude),
            other => Err(ConfigError::UnknownVariant {
                field: "edge strategy",
                value: other.to_string(),
                expected: "two_sided, magnitude",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max distance between a secondary line and the primary line for the
    /// secondary's odds to count.
    pub line_tolerance: f64,
    pub top_n: usize,
    pub projection_top_n: usize,
    pub strategy: EdgeStrategy,
    pub merge_key_scheme: KeyScheme,
    pub projection_key_scheme: KeyScheme,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            top_n: DEFAULT_TOP_N,
            projection_top_n: DEFAULT_TOP_N,
            strategy: EdgeStrategy::TwoSided,
            merge_key_scheme: KeyScheme::FullName,
            projection_key_scheme: KeyScheme::FullName,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `PROPS_*` environment variables. Unparseable
    /// numbers keep the default; unknown enum names are reported.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<f64>("PROPS_LINE_TOLERANCE") {
            cfg.line_tolerance = v;
        }
        if let Some(v) = env_parse::<usize>("PROPS_TOP_N") {
            cfg.top_n = v;
        }
        if let Some(v) = env_parse::<usize>("PROPS_PROJECTION_TOP_N") {
            cfg.projection_top_n = v;
        }
        if let Some(raw) = opt_env("PROPS_EDGE_STRATEGY") {
            cfg.strategy = raw.parse()?;
        }
        if let Some(raw) = opt_env("PROPS_MERGE_KEY") {
            cfg.merge_key_scheme = raw.parse()?;
        }
        if let Some(raw) = opt_env("PROPS_PROJECTION_KEY") {
            cfg.projection_key_scheme = raw.parse()?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg = serde_json::from_str::<EngineConfig>(&raw)
            .with_context(|| format!("parse engine config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(self.line_tolerance));
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN { field: "top_n" });
        }
        if self.projection_top_n == 0 {
            return Err(ConfigError::ZeroTopN {
                field: "projection_top_n",
            });
        }
        Ok(())
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|v| v.parse::<T>().ok())
}
