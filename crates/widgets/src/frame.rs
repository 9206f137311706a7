use overlay_core::{state::MetricsSnapshot, widget::OverlayWidget};
use overlay_metrics::format::format_ms;

/// Displays the smoothed frame time, e.g. `Frame: 13.83 ms`.
#[derive(Debug)]
pub struct FrameWidget {
    label:     String,
    precision: usize,
}

impl FrameWidget {
    pub fn new(label: Option<String>, precision: Option<usize>) -> Self {
        Self {
            label:     label.unwrap_or_else(|| "Frame".to_string()),
            precision: precision.unwrap_or(2),
        }
    }
}

impl Default for FrameWidget {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl OverlayWidget for FrameWidget {
    fn id(&self) -> &str {
        "frame"
    }

    fn line(&self, snapshot: &MetricsSnapshot) -> Option<String> {
        Some(format!(
            "{}: {}",
            self.label,
            format_ms(snapshot.frame_time_ms, self.precision)
        ))
    }
}
