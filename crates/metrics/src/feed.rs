//! Counter feeds: the seam between the aggregator and whatever produces
//! hardware or profiler timings.

use overlay_core::Result;
use std::fmt;

/// An open subscription to one timing counter.
///
/// Samples are raw durations in nanoseconds. The feed may sample at a
/// different rate than the display tick, so a drain can return any number
/// of samples, including none.
pub trait CounterFeed: Send + fmt::Debug {
    /// Append every sample recorded since the previous drain to `out`.
    /// Each sample is handed out at most once.
    fn drain(&mut self, out: &mut Vec<u64>);

    /// Release the subscription. Must be safe to call more than once.
    fn close(&mut self) {}
}

/// Something that can open counter feeds by name.
pub trait FeedSource {
    /// Open the counter called `counter`, buffering up to `capacity` samples
    /// between drains.
    fn open(&self, counter: &str, capacity: usize) -> Result<Box<dyn CounterFeed>>;
}

/// A channel the aggregator should track: display name plus candidate
/// counter names, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub name:     String,
    pub counters: Vec<String>,
}

impl ChannelRequest {
    pub fn new<I, S>(name: impl Into<String>, counters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name:     name.into(),
            counters: counters.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&overlay_config::ChannelConfig> for ChannelRequest {
    fn from(cfg: &overlay_config::ChannelConfig) -> Self {
        Self::new(cfg.name.clone(), cfg.counters.iter().cloned())
    }
}

/// Outcome of opening one channel during `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// The channel is live, backed by `counter`.
    Opened { channel: String, counter: String },
    /// No candidate counter could be opened; the channel reports
    /// unavailable until the next start.
    Unavailable { channel: String, reason: String },
}

impl FeedStatus {
    pub fn channel(&self) -> &str {
        match self {
            Self::Opened { channel, .. } | Self::Unavailable { channel, .. } => channel,
        }
    }

    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened { .. })
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { channel, counter } => write!(f, "{channel}: opened '{counter}'"),
            Self::Unavailable { channel, reason } => write!(f, "{channel}: unavailable ({reason})"),
        }
    }
}
