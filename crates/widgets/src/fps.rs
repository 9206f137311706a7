use overlay_core::{state::MetricsSnapshot, widget::OverlayWidget};
use overlay_metrics::format::format_value;

/// Displays the smoothed frame rate, e.g. `FPS: 72.3`.
#[derive(Debug)]
pub struct FpsWidget {
    label:     String,
    precision: usize,
}

impl FpsWidget {
    pub fn new(label: Option<String>, precision: Option<usize>) -> Self {
        Self {
            label:     label.unwrap_or_else(|| "FPS".to_string()),
            precision: precision.unwrap_or(1),
        }
    }
}

impl Default for FpsWidget {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl OverlayWidget for FpsWidget {
    fn id(&self) -> &str {
        "fps"
    }

    fn line(&self, snapshot: &MetricsSnapshot) -> Option<String> {
        Some(format!("{}: {}", self.label, format_value(snapshot.fps, self.precision)))
    }
}
