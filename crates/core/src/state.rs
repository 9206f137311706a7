use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A smoothed timing value, in milliseconds.
///
/// A channel that has nothing to report is `Unavailable`, which is kept apart
/// from a channel that legitimately measured zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "ms", rename_all = "snake_case")]
pub enum Reading {
    /// A positive measurement.
    Value(f64),
    /// The source is present and measured exactly zero.
    Zero,
    /// No measurement exists (source missing, never sampled, or stopped).
    #[default]
    Unavailable,
}

impl Reading {
    /// Classify a finite, non-negative millisecond value.
    ///
    /// Anything that cannot be displayed as a duration maps to `Unavailable`.
    #[must_use]
    pub fn from_ms(ms: f64) -> Self {
        if !ms.is_finite() || ms < 0.0 {
            Self::Unavailable
        } else if ms == 0.0 {
            Self::Zero
        } else {
            Self::Value(ms)
        }
    }

    /// `None` for `Unavailable`, the value otherwise (`Zero` → `0.0`).
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(ms) => Some(ms),
            Self::Zero => Some(0.0),
            Self::Unavailable => None,
        }
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Latest smoothed value of one named counter channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelReading {
    /// Display name, e.g. `"CPU Main"`.
    pub name: String,
    pub reading: Reading,
}

/// A point-in-time read of the aggregated overlay metrics.
///
/// Produced fresh on every read; the aggregator never keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Local time the snapshot was taken.
    pub taken_at: DateTime<Local>,
    /// Mean frame time over the current window occupancy.
    pub frame_time_ms: Reading,
    /// `1000 / frame_time_ms`; unavailable when the mean is missing or zero.
    pub fps: Reading,
    /// One entry per configured channel, in configuration order.
    pub channels: Vec<ChannelReading>,
}

impl MetricsSnapshot {
    /// A snapshot with every reading unavailable.
    pub fn unavailable<I, S>(channel_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken_at: Local::now(),
            frame_time_ms: Reading::Unavailable,
            fps: Reading::Unavailable,
            channels: channel_names
                .into_iter()
                .map(|name| ChannelReading {
                    name: name.into(),
                    reading: Reading::Unavailable,
                })
                .collect(),
        }
    }

    /// Look up a channel by display name.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<Reading> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.reading)
    }
}
