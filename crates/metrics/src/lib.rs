pub mod aggregator;
pub mod feed;
pub mod format;
pub mod recorder;
pub mod window;

pub use aggregator::MetricsAggregator;
pub use feed::{ChannelRequest, CounterFeed, FeedSource, FeedStatus};
pub use recorder::{Recorder, RecorderHub};
pub use window::SampleWindow;

use overlay_config::SamplingConfig;
use overlay_core::{state::MetricsSnapshot, Result};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Counter name the monitor times its own tick body under.
pub const MAIN_THREAD: &str = "Main Thread";
/// Counter name the display loop times its redraws under.
pub const RENDER_THREAD: &str = "Render Thread";

/// Tick rate and window size of a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub sample_count: usize,
    pub tick:         Duration,
}

impl From<&SamplingConfig> for MonitorSettings {
    fn from(cfg: &SamplingConfig) -> Self {
        Self {
            sample_count: cfg.sample_count,
            tick:         Duration::from_millis(cfg.tick_ms),
        }
    }
}

/// Handle to a running monitor task.
///
/// Dropping the handle signals the task to stop; use [`stop`](Self::stop)
/// to also wait until every feed has been released.
#[derive(Debug)]
pub struct MonitorHandle {
    statuses: Vec<FeedStatus>,
    rx:       mpsc::Receiver<MetricsSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task:     Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Per-channel result of opening the feeds.
    pub fn statuses(&self) -> &[FeedStatus] {
        &self.statuses
    }

    /// Next snapshot, or `None` once the task has exited.
    pub async fn recv(&mut self) -> Option<MetricsSnapshot> {
        self.rx.recv().await
    }

    /// Stop the task and wait for it to release its feeds.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("metrics monitor task failed: {e}");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start an aggregator over `channels` and spawn a Tokio task that ticks it
/// every `settings.tick`, forwarding a [`MetricsSnapshot`] per tick.
///
/// Feeds are opened before this returns, so startup errors surface here.
/// When `main_thread` is given, the tick body is timed into it. Snapshots
/// are dropped rather than queued while the receiver lags behind.
pub fn spawn_monitor(
    settings: MonitorSettings,
    channels: &[ChannelRequest],
    source: &dyn FeedSource,
    main_thread: Option<Recorder>,
) -> Result<MonitorHandle> {
    let mut aggregator = MetricsAggregator::new();
    let statuses = aggregator.start(settings.sample_count, channels, source)?;
    for status in &statuses {
        debug!("{status}");
    }

    let (tx, rx) = mpsc::channel(4);
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(settings.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately
        let mut last = Instant::now();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {}
            }

            let snapshot = {
                let _timer = main_thread.as_ref().map(Recorder::scope);
                let now = Instant::now();
                aggregator.record_frame(now.duration_since(last).as_secs_f64() * 1000.0);
                last = now;
                aggregator.poll();
                aggregator.snapshot()
            };

            match tx.try_send(snapshot) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => trace!("display lagging; snapshot dropped"),
                Err(mpsc::error::TrySendError::Closed(_)) => break, // receiver dropped
            }
        }

        aggregator.stop();
        info!("metrics monitor exited");
    });

    Ok(MonitorHandle {
        statuses,
        rx,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}
