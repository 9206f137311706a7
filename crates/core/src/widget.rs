use crate::state::MetricsSnapshot;

/// Every overlay line type must implement this trait.
///
/// Widgets are purely reactive: they receive a read-only snapshot and return
/// the text of their line, or `None` when they have nothing to show.
pub trait OverlayWidget: Send + Sync + std::fmt::Debug {
    /// Unique string identifier, e.g. `"fps"` or `"channel"`.
    fn id(&self) -> &str;

    /// Format this widget's line for the given snapshot.
    fn line(&self, snapshot: &MetricsSnapshot) -> Option<String>;
}
