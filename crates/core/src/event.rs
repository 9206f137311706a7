use crate::state::MetricsSnapshot;

/// All messages (events) that can flow through the overlay's main loop.
///
/// Sources:
/// - Metrics monitor task  → `Snapshot`
/// - Config watcher task   → `ConfigReloaded`
/// - Ctrl-C handler        → `Shutdown`
#[derive(Debug, Clone)]
pub enum Message {
    /// Fresh metrics snapshot from the background monitor task.
    Snapshot(MetricsSnapshot),
    /// Config file changed on disk — triggers a monitor restart.
    ConfigReloaded,
    /// Graceful shutdown requested.
    Shutdown,
}
