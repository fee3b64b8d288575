//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `dominion-config.yaml` at the
//! deployment root. This module defines strongly-typed structs mirroring
//! the YAML layout, with serde defaults so a missing file or a partial one
//! behaves identically to the documented defaults.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration for the realm and engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominionConfig {
    /// Tax collection settings.
    #[serde(default)]
    pub taxes: TaxSettings,

    /// Paid-claim settings.
    #[serde(default)]
    pub claims: ClaimSettings,

    /// Engine shell settings (snapshot path, sweep cadence).
    #[serde(default)]
    pub engine: EngineSettings,
}

impl DominionConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_yml::from_str(&contents)?;
        Ok(config)
    }
}

/// Tax collection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Master switch for the whole tax system.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between town collections. Clamped to a five-minute floor
    /// when converted to an interval.
    #[serde(default = "default_tax_interval")]
    pub town_interval_secs: u64,

    /// Seconds between nation collections. Same floor.
    #[serde(default = "default_tax_interval")]
    pub nation_interval_secs: u64,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            town_interval_secs: default_tax_interval(),
            nation_interval_secs: default_tax_interval(),
        }
    }
}

/// Payment source ordering for paid claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayPriority {
    /// Charge the town bank first, falling back to the actor's wallet.
    #[default]
    TownFirst,
    /// Charge the actor's wallet first, falling back to the town bank.
    ActorFirst,
}

/// Paid-claim settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSettings {
    /// Number of claims each town may take before cost applies.
    #[serde(default = "default_free_claims")]
    pub free_claims: usize,

    /// Flat cost per claim beyond the free allowance.
    #[serde(default = "default_claim_cost")]
    pub claim_cost: Decimal,

    /// Which funding source is tried first.
    #[serde(default)]
    pub pay_priority: PayPriority,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            free_claims: default_free_claims(),
            claim_cost: default_claim_cost(),
            pay_priority: PayPriority::TownFirst,
        }
    }
}

/// Engine shell settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Where the realm snapshot is loaded from and saved to.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Seconds between tax sweep ticks.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// One day between collections.
const fn default_tax_interval() -> u64 {
    86_400
}

const fn default_free_claims() -> usize {
    10
}

const fn default_claim_cost() -> Decimal {
    Decimal::from_parts(50, 0, 0, false, 0)
}

fn default_snapshot_path() -> String {
    String::from("dominion-snapshot.json")
}

const fn default_sweep_interval() -> u64 {
    60
}
