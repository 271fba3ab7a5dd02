//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the engine TOML file, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::precision::MAX_DECIMALS;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid config file: {}", path.display()))?;

  info!(
    name = %config.engine.name,
    markets = config.markets.len(),
    commit_timeout_ms = config.engine.commit_timeout_ms,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse TOML")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive timeout and channel capacity
/// - Decimal scales rust_decimal can represent
/// - Non-negative, finite thresholds
/// - Unique, non-empty market ids with positive liquidity
fn validate_config(config: &AppConfig) -> Result<()> {
  // Engine validation
  anyhow::ensure!(
    config.engine.commit_timeout_ms > 0,
    "commit_timeout_ms must be positive"
  );
  anyhow::ensure!(
    config.engine.broadcast_capacity > 0,
    "broadcast_capacity must be positive"
  );

  // Pricing validation
  let pricing = &config.pricing;
  for (name, decimals) in [
    ("share_decimals", pricing.share_decimals),
    ("price_decimals", pricing.price_decimals),
    ("probability_decimals", pricing.probability_decimals),
  ] {
    anyhow::ensure!(
      decimals <= MAX_DECIMALS,
      "{} must be at most {}, got {}",
      name,
      MAX_DECIMALS,
      decimals
    );
  }
  anyhow::ensure!(
    pricing.slippage_warning_pct.is_finite() && pricing.slippage_warning_pct >= 0.0,
    "slippage_warning_pct must be a non-negative number, got {}",
    pricing.slippage_warning_pct
  );
  anyhow::ensure!(
    pricing.drift_epsilon.is_finite() && pricing.drift_epsilon >= 0.0,
    "drift_epsilon must be a non-negative number, got {}",
    pricing.drift_epsilon
  );

  // Market validation
  let mut seen = HashSet::new();
  for (i, market) in config.markets.iter().enumerate() {
    anyhow::ensure!(!market.id.is_empty(), "Market {} has empty id", i);
    anyhow::ensure!(
      seen.insert(market.id.as_str()),
      "Market id {} is configured twice",
      market.id
    );
    anyhow::ensure!(
      market.liquidity_b.is_finite() && market.liquidity_b > 0.0,
      "Market {} liquidity_b must be positive, got {}",
      market.id,
      market.liquidity_b
    );
  }

  Ok(())
}
