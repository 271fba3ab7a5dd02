//! Tracing subscriber setup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Calling this again after a
/// subscriber is installed is a no-op, so tests may call it freely.
pub fn init_tracing(level: &str, json: bool) -> Result<()> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .map_err(|e| anyhow::anyhow!("Invalid log level {level:?}: {e}"))?;

  let builder = tracing_subscriber::fmt().with_env_filter(filter);
  let installed = if json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };
  if installed.is_err() {
    tracing::debug!("Tracing subscriber already installed");
  }
  Ok(())
}

/// [`init_tracing`] with the configured `log_level` and `json_logs`.
pub fn init_tracing_from(config: &EngineConfig) -> Result<()> {
  init_tracing(&config.log_level, config.json_logs)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_repeated_init_is_harmless() {
    init_tracing("info", true).unwrap();
    init_tracing("debug", false).unwrap();
  }

  #[test]
  fn test_init_from_config() {
    init_tracing_from(&EngineConfig::default()).unwrap();
    let config = EngineConfig {
      log_level: "lmsr_engine=trace,warn".to_string(),
      json_logs: false,
      ..EngineConfig::default()
    };
    init_tracing_from(&config).unwrap();
  }
}
