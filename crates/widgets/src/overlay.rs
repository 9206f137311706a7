use crate::{ChannelWidget, FpsWidget, FrameWidget};
use overlay_config::WidgetConfig;
use overlay_core::{state::MetricsSnapshot, widget::OverlayWidget};
use tracing::warn;

/// Ordered list of overlay lines built from the `[[lines]]` config.
#[derive(Debug, Default)]
pub struct Overlay {
    widgets: Vec<Box<dyn OverlayWidget>>,
}

impl Overlay {
    /// Build the overlay; unknown or incomplete widget entries are skipped
    /// with a warning.
    pub fn from_config(lines: &[WidgetConfig]) -> Self {
        let widgets = lines.iter().filter_map(build_widget).collect();
        Self { widgets }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// All lines for `snapshot`, newline-separated.
    pub fn render(&self, snapshot: &MetricsSnapshot) -> String {
        self.widgets
            .iter()
            .filter_map(|w| w.line(snapshot))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn build_widget(cfg: &WidgetConfig) -> Option<Box<dyn OverlayWidget>> {
    let label = cfg.label.clone();
    match cfg.kind.as_str() {
        "fps" => Some(Box::new(FpsWidget::new(label, cfg.precision))),
        "frame" => Some(Box::new(FrameWidget::new(label, cfg.precision))),
        "channel" => match &cfg.channel {
            Some(channel) => Some(Box::new(ChannelWidget::new(channel.clone(), label, cfg.precision))),
            None => {
                warn!("channel widget without a `channel` key; skipped");
                None
            }
        },
        other => {
            warn!("unknown widget kind '{other}'; skipped");
            None
        }
    }
}
