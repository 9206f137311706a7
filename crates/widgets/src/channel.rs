use overlay_core::{state::MetricsSnapshot, widget::OverlayWidget};
use overlay_metrics::format::format_ms;

/// Displays one counter channel, e.g. `CPU Main (avg): 4.10 ms`.
///
/// Returns `None` when the snapshot has no such channel — the line is
/// skipped. A channel that exists but has no data shows `N/A`.
#[derive(Debug)]
pub struct ChannelWidget {
    channel:   String,
    label:     String,
    precision: usize,
}

impl ChannelWidget {
    pub fn new(channel: impl Into<String>, label: Option<String>, precision: Option<usize>) -> Self {
        let channel = channel.into();
        Self {
            label: label.unwrap_or_else(|| format!("{channel} (avg)")),
            channel,
            precision: precision.unwrap_or(2),
        }
    }
}

impl OverlayWidget for ChannelWidget {
    fn id(&self) -> &str {
        "channel"
    }

    fn line(&self, snapshot: &MetricsSnapshot) -> Option<String> {
        let reading = snapshot.channel(&self.channel)?;
        Some(format!("{}: {}", self.label, format_ms(reading, self.precision)))
    }
}
