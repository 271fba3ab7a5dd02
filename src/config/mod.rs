//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates engine configuration from a TOML file. Market
//! parameters and precision rules are externalized here; nothing is
//! hardcoded in the domain layer beyond the defaults below.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::precision::PricingPolicy;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Engine identity, logging and commit tuning.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Precision policy and monitoring thresholds.
  #[serde(default)]
  pub pricing: PricingConfig,
  /// Markets opened at startup.
  #[serde(default)]
  pub markets: Vec<MarketConfig>,
}

/// Engine identity and runtime tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Human-readable engine name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Emit JSON log lines instead of human-readable ones.
  #[serde(default = "default_true")]
  pub json_logs: bool,
  /// Maximum time a commit may spend waiting for the market lock and
  /// the wallet debit before it aborts.
  #[serde(default = "default_commit_timeout")]
  pub commit_timeout_ms: u64,
  /// Per-subscriber buffer of the update broadcast channel.
  #[serde(default = "default_broadcast_capacity")]
  pub broadcast_capacity: usize,
}

/// Precision policy and drift tolerance.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
  /// Decimals kept on share quantities.
  #[serde(default = "default_share_decimals")]
  pub share_decimals: u32,
  /// Decimals kept on minor-unit prices.
  #[serde(default = "default_price_decimals")]
  pub price_decimals: u32,
  /// Decimals kept on percentages.
  #[serde(default = "default_probability_decimals")]
  pub probability_decimals: u32,
  /// Price impact (percent) above which estimates warn.
  #[serde(default = "default_slippage_warning")]
  pub slippage_warning_pct: f64,
  /// Largest tolerated gap between a client mirror and the engine.
  #[serde(default = "default_drift_epsilon")]
  pub drift_epsilon: f64,
}

/// A market opened when the engine starts.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
  /// Market identifier.
  pub id: String,
  /// LMSR liquidity parameter (b). Higher = deeper, slower-moving prices.
  pub liquidity_b: f64,
}

impl EngineConfig {
  /// Commit timeout as a `Duration`.
  pub const fn commit_timeout(&self) -> Duration {
    Duration::from_millis(self.commit_timeout_ms)
  }
}

impl PricingConfig {
  /// The rounding policy these settings describe.
  pub const fn policy(&self) -> PricingPolicy {
    PricingPolicy {
      share_decimals: self.share_decimals,
      price_decimals: self.price_decimals,
      probability_decimals: self.probability_decimals,
      slippage_warning_pct: self.slippage_warning_pct,
    }
  }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      json_logs: default_true(),
      commit_timeout_ms: default_commit_timeout(),
      broadcast_capacity: default_broadcast_capacity(),
    }
  }
}

impl Default for PricingConfig {
  fn default() -> Self {
    Self {
      share_decimals: default_share_decimals(),
      price_decimals: default_price_decimals(),
      probability_decimals: default_probability_decimals(),
      slippage_warning_pct: default_slippage_warning(),
      drift_epsilon: default_drift_epsilon(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "lmsr-engine".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

const fn default_true() -> bool {
  true
}

const fn default_commit_timeout() -> u64 {
  2_000
}

const fn default_broadcast_capacity() -> usize {
  1_024
}

const fn default_share_decimals() -> u32 {
  8
}

const fn default_price_decimals() -> u32 {
  4
}

const fn default_probability_decimals() -> u32 {
  2
}

const fn default_slippage_warning() -> f64 {
  1.0
}

const fn default_drift_epsilon() -> f64 {
  0.01
}
