pub mod schema;
pub mod watcher;

pub use schema::{
    ChannelConfig, OutputConfig, OutputFormat, OverlayConfig, SamplingConfig, WidgetConfig,
};
pub use watcher::ConfigWatcher;

use overlay_core::{OverlayError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `OverlayConfig::default()`
/// if the file doesn't exist so the overlay always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<OverlayConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(OverlayConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| OverlayError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<OverlayConfig> {
    let config: OverlayConfig =
        toml::from_str(raw).map_err(|e| OverlayError::Config(format!("TOML parse error: {e}")))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &OverlayConfig) -> Result<()> {
    if config.sampling.sample_count == 0 {
        return Err(OverlayError::Config("sampling.sample_count must be at least 1".into()));
    }
    if config.sampling.tick_ms == 0 {
        return Err(OverlayError::Config("sampling.tick_ms must be at least 1".into()));
    }
    for channel in &config.channels {
        if channel.counters.is_empty() {
            return Err(OverlayError::Config(format!(
                "channel '{}' lists no counters",
                channel.name
            )));
        }
    }
    Ok(())
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("perf-overlay").join("overlay.toml")
}
