use serde::{Deserialize, Serialize};

/// Root configuration structure parsed from `overlay.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Window size and tick rate of the aggregator.
    pub sampling: SamplingConfig,
    /// How snapshots are written out.
    pub output: OutputConfig,
    /// Counter channels, in display order.
    pub channels: Vec<ChannelConfig>,
    /// Overlay lines, top to bottom.
    pub lines: Vec<WidgetConfig>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            output: OutputConfig::default(),
            channels: vec![
                ChannelConfig::new("CPU Main", ["Main Thread"]),
                ChannelConfig::new("Render Thread", ["Render Thread"]),
                ChannelConfig::new("GPU", ["GPU Frame Time"]),
            ],
            lines: vec![
                WidgetConfig::new("fps"),
                WidgetConfig::new("frame"),
                WidgetConfig::channel("CPU Main"),
                WidgetConfig::channel("Render Thread"),
                WidgetConfig::channel("GPU"),
            ],
        }
    }
}

/// Aggregator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Frame-time window length and per-counter buffer capacity.
    pub sample_count: usize,
    /// Interval between aggregator ticks, in milliseconds.
    pub tick_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: 120,
            tick_ms: 16,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Minimum interval between two redraws, in milliseconds.
    pub refresh_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            refresh_ms: 250,
        }
    }
}

/// Overlay output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable block redrawn in place.
    #[default]
    Text,
    /// One JSON snapshot per line.
    Json,
}

/// One counter channel: a display name plus the counter names to try.
///
/// Counter names differ between platforms, so several candidates may be
/// listed; the first one that opens is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub counters: Vec<String>,
}

impl ChannelConfig {
    pub fn new<I, S>(name: impl Into<String>, counters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            counters: counters.into_iter().map(Into::into).collect(),
        }
    }
}

/// Config block for a single overlay line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Widget type identifier: `"fps"`, `"frame"` or `"channel"`.
    pub kind: String,
    /// Optional display label override.
    #[serde(default)]
    pub label: Option<String>,
    /// Channel name, for `"channel"` widgets.
    #[serde(default)]
    pub channel: Option<String>,
    /// Digits after the decimal point.
    #[serde(default)]
    pub precision: Option<usize>,
}

impl WidgetConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: None,
            channel: None,
            precision: None,
        }
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self {
            channel: Some(name.into()),
            ..Self::new("channel")
        }
    }
}
