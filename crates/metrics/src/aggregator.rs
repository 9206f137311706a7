use crate::feed::{ChannelRequest, CounterFeed, FeedSource, FeedStatus};
use crate::window::SampleWindow;
use chrono::Local;
use overlay_core::{
    state::{ChannelReading, MetricsSnapshot, Reading},
    Result,
};
use tracing::{debug, info, trace, warn};

const NANOS_PER_MS: f64 = 1_000_000.0;

/// One tracked counter channel.
///
/// The feed is closed when the channel is released or dropped, so a channel
/// built during a `start` that never completes still gives its feed back.
#[derive(Debug)]
struct Channel {
    name:      String,
    feed:      Option<Box<dyn CounterFeed>>,
    /// Mean of the most recent non-empty batch, in milliseconds.
    latest_ms: Option<f64>,
}

impl Channel {
    fn release(&mut self) {
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
        self.latest_ms = None;
    }

    fn reading(&self) -> Reading {
        match self.latest_ms {
            Some(ms) if self.feed.is_some() => Reading::from_ms(ms),
            _ => Reading::Unavailable,
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.release();
    }
}

/// Turns per-tick frame durations and counter sample batches into smoothed
/// overlay readings.
///
/// Meant to be driven from a single task: `record_frame` and `poll` once per
/// tick, `snapshot` whenever the display wants a value.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    /// `None` while stopped.
    frames:   Option<SampleWindow>,
    channels: Vec<Channel>,
    /// Reused drain buffer.
    scratch:  Vec<u64>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking with a frame window of `window_size` samples and one
    /// channel per request.
    ///
    /// Channels whose counters cannot be opened are reported as
    /// [`FeedStatus::Unavailable`] and do not affect the others. A running
    /// aggregator is stopped first.
    pub fn start(
        &mut self,
        window_size: usize,
        requests: &[ChannelRequest],
        source: &dyn FeedSource,
    ) -> Result<Vec<FeedStatus>> {
        self.stop();
        let frames = SampleWindow::new(window_size)?;

        let mut channels = Vec::with_capacity(requests.len());
        let mut statuses = Vec::with_capacity(requests.len());

        for request in requests {
            let (feed, status) = open_channel(request, window_size, source);
            match &status {
                FeedStatus::Opened { channel, counter } => {
                    debug!(channel = %channel, counter = %counter, "feed opened");
                }
                FeedStatus::Unavailable { channel, reason } => {
                    warn!(channel = %channel, "feed unavailable: {reason}");
                }
            }
            channels.push(Channel {
                name: request.name.clone(),
                feed,
                latest_ms: None,
            });
            statuses.push(status);
        }

        let opened = statuses.iter().filter(|s| s.is_opened()).count();
        info!(window_size, opened, requested = requests.len(), "metrics aggregator started");

        self.frames = Some(frames);
        self.channels = channels;
        self.scratch = Vec::with_capacity(window_size);
        Ok(statuses)
    }

    /// Record the wall-clock duration of the previous tick.
    ///
    /// Negative, NaN and infinite values are recorded as `0.0`.
    pub fn record_frame(&mut self, duration_ms: f64) {
        let Some(frames) = self.frames.as_mut() else {
            return;
        };
        let value = if duration_ms.is_finite() && duration_ms > 0.0 {
            duration_ms
        } else {
            if duration_ms != 0.0 {
                trace!(duration_ms, "clamping invalid frame duration to zero");
            }
            0.0
        };
        frames.push(value);
    }

    /// Drain every open feed and update its channel's smoothed value.
    ///
    /// An empty batch keeps the previous value.
    pub fn poll(&mut self) {
        if self.frames.is_none() {
            return;
        }
        for channel in &mut self.channels {
            let Some(feed) = channel.feed.as_mut() else {
                continue;
            };
            self.scratch.clear();
            feed.drain(&mut self.scratch);
            if self.scratch.is_empty() {
                continue;
            }

            let sum: f64 = self.scratch.iter().map(|&ns| ns as f64).sum();
            let mean_ns = sum / self.scratch.len() as f64;
            channel.latest_ms = Some(mean_ns / NANOS_PER_MS);
        }
    }

    /// Read the current smoothed metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mean = self.frames.as_ref().and_then(SampleWindow::mean);

        let (frame_time_ms, fps) = match mean {
            Some(ms) if ms > 0.0 => (Reading::from_ms(ms), Reading::from_ms(1000.0 / ms)),
            Some(ms) => (Reading::from_ms(ms), Reading::Unavailable),
            None => (Reading::Unavailable, Reading::Unavailable),
        };

        MetricsSnapshot {
            taken_at: Local::now(),
            frame_time_ms,
            fps,
            channels: self
                .channels
                .iter()
                .map(|c| ChannelReading {
                    name:    c.name.clone(),
                    reading: c.reading(),
                })
                .collect(),
        }
    }

    /// Release every feed and clear all windows. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.frames.take().is_none() {
            return;
        }
        for channel in &mut self.channels {
            channel.release();
        }
        self.scratch.clear();
        info!("metrics aggregator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.frames.is_some()
    }

    /// Number of frame samples currently held.
    pub fn frame_count(&self) -> usize {
        self.frames.as_ref().map_or(0, SampleWindow::len)
    }
}

impl Drop for MetricsAggregator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_channel(
    request: &ChannelRequest,
    capacity: usize,
    source: &dyn FeedSource,
) -> (Option<Box<dyn CounterFeed>>, FeedStatus) {
    let mut errors = Vec::new();
    for counter in &request.counters {
        match source.open(counter, capacity) {
            Ok(feed) => {
                let status = FeedStatus::Opened {
                    channel: request.name.clone(),
                    counter: counter.clone(),
                };
                return (Some(feed), status);
            }
            Err(e) => errors.push(format!("{counter}: {e}")),
        }
    }

    let reason = if errors.is_empty() {
        "no counters listed".to_string()
    } else {
        errors.join("; ")
    };
    let status = FeedStatus::Unavailable {
        channel: request.name.clone(),
        reason,
    };
    (None, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::OverlayError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct ScriptedFeed {
        batches: VecDeque<Vec<u64>>,
        closed:  Arc<AtomicUsize>,
        is_open: bool,
    }

    impl CounterFeed for ScriptedFeed {
        fn drain(&mut self, out: &mut Vec<u64>) {
            if let Some(batch) = self.batches.pop_front() {
                out.extend(batch);
            }
        }

        fn close(&mut self) {
            if self.is_open {
                self.is_open = false;
                self.closed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Serves scripted batches for known counters; anything else fails to open.
    #[derive(Default)]
    struct ScriptedSource {
        scripts: HashMap<String, Vec<Vec<u64>>>,
        opened:  Arc<AtomicUsize>,
        closed:  Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn with(mut self, counter: &str, batches: Vec<Vec<u64>>) -> Self {
            self.scripts.insert(counter.to_string(), batches);
            self
        }
    }

    impl FeedSource for ScriptedSource {
        fn open(&self, counter: &str, _capacity: usize) -> Result<Box<dyn CounterFeed>> {
            let batches = self
                .scripts
                .get(counter)
                .ok_or_else(|| OverlayError::Feed(format!("no counter '{counter}'")))?;
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedFeed {
                batches: batches.iter().cloned().collect(),
                closed:  Arc::clone(&self.closed),
                is_open: true,
            }))
        }
    }

    fn started(window: usize, requests: &[ChannelRequest], source: &ScriptedSource) -> MetricsAggregator {
        let mut agg = MetricsAggregator::new();
        agg.start(window, requests, source).unwrap();
        agg
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn three_frames_average_to_fifty_fps() {
        let mut agg = started(3, &[], &ScriptedSource::default());
        for ms in [10.0, 20.0, 30.0] {
            agg.record_frame(ms);
        }
        let snap = agg.snapshot();
        assert_eq!(snap.frame_time_ms, Reading::Value(20.0));
        assert_eq!(snap.fps, Reading::Value(50.0));
    }

    #[test]
    fn window_keeps_newest_frames() {
        let mut agg = started(2, &[], &ScriptedSource::default());
        for ms in [10.0, 20.0, 30.0] {
            agg.record_frame(ms);
        }
        assert_eq!(agg.frame_count(), 2);
        assert_eq!(agg.snapshot().frame_time_ms, Reading::Value(25.0));
    }

    #[test]
    fn fps_is_reciprocal_of_frame_time() {
        let mut agg = started(5, &[], &ScriptedSource::default());
        for ms in [16.6, 17.1, 33.4, 8.3, 11.0, 12.9, 16.7] {
            agg.record_frame(ms);
            let snap = agg.snapshot();
            let frame = snap.frame_time_ms.value().unwrap();
            assert_eq!(snap.fps, Reading::Value(1000.0 / frame));
        }
    }

    #[test]
    fn empty_window_reports_unavailable() {
        let agg = started(4, &[], &ScriptedSource::default());
        let snap = agg.snapshot();
        assert_eq!(snap.frame_time_ms, Reading::Unavailable);
        assert_eq!(snap.fps, Reading::Unavailable);
    }

    #[test]
    fn negative_frame_matches_zero_frame() {
        let mut a = started(3, &[], &ScriptedSource::default());
        let mut b = started(3, &[], &ScriptedSource::default());
        for (x, y) in [(-5.0, 0.0), (12.0, 12.0), (f64::NAN, 0.0)] {
            a.record_frame(x);
            b.record_frame(y);
        }
        assert_eq!(a.snapshot().frame_time_ms, b.snapshot().frame_time_ms);
        assert_eq!(a.snapshot().frame_time_ms, Reading::Value(4.0));
    }

    #[test]
    fn all_zero_frames_are_zero_not_unavailable() {
        let mut agg = started(3, &[], &ScriptedSource::default());
        agg.record_frame(0.0);
        let snap = agg.snapshot();
        assert_eq!(snap.frame_time_ms, Reading::Zero);
        assert_eq!(snap.fps, Reading::Unavailable);
    }

    #[test]
    fn silent_feed_stays_unavailable() {
        let source = ScriptedSource::default().with("GPU Frame Time", vec![]);
        let mut agg = started(4, &[ChannelRequest::new("GPU", ["GPU Frame Time"])], &source);
        for _ in 0..5 {
            agg.record_frame(16.0);
            agg.poll();
            assert_eq!(agg.snapshot().channel("GPU"), Some(Reading::Unavailable));
        }
    }

    #[test]
    fn empty_batch_preserves_last_value() {
        let source = ScriptedSource::default().with("Main Thread", vec![vec![5, 7], vec![]]);
        let mut agg = started(4, &[ChannelRequest::new("CPU Main", ["Main Thread"])], &source);

        agg.poll();
        let first = agg.snapshot().channel("CPU Main").and_then(Reading::value).unwrap();
        assert!(approx(first, 6e-6), "got {first}");

        agg.poll();
        let second = agg.snapshot().channel("CPU Main").and_then(Reading::value).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_samples_read_as_zero() {
        let source = ScriptedSource::default().with("Main Thread", vec![vec![0, 0]]);
        let mut agg = started(4, &[ChannelRequest::new("CPU Main", ["Main Thread"])], &source);
        agg.poll();
        assert_eq!(agg.snapshot().channel("CPU Main"), Some(Reading::Zero));
    }

    #[test]
    fn falls_back_to_next_counter_name() {
        let source = ScriptedSource::default().with("Gfx.Present", vec![vec![2_000_000]]);
        let request = ChannelRequest::new("Render Thread", ["Render Thread", "Gfx.Present"]);
        let mut agg = MetricsAggregator::new();
        let statuses = agg.start(4, &[request], &source).unwrap();

        assert_eq!(
            statuses[0],
            FeedStatus::Opened {
                channel: "Render Thread".into(),
                counter: "Gfx.Present".into(),
            }
        );
        agg.poll();
        assert_eq!(agg.snapshot().channel("Render Thread"), Some(Reading::Value(2.0)));
    }

    #[test]
    fn missing_feed_does_not_block_others() {
        let source = ScriptedSource::default().with("Main Thread", vec![vec![1_000_000]]);
        let requests = [
            ChannelRequest::new("GPU", ["GPU Frame Time"]),
            ChannelRequest::new("CPU Main", ["Main Thread"]),
        ];
        let mut agg = MetricsAggregator::new();
        let statuses = agg.start(4, &requests, &source).unwrap();

        assert!(!statuses[0].is_opened());
        assert!(statuses[1].is_opened());
        agg.record_frame(10.0);
        agg.poll();
        let snap = agg.snapshot();
        assert_eq!(snap.channel("GPU"), Some(Reading::Unavailable));
        assert_eq!(snap.channel("CPU Main"), Some(Reading::Value(1.0)));
        assert_eq!(snap.fps, Reading::Value(100.0));
    }

    #[test]
    fn zero_window_is_rejected_without_opening_feeds() {
        let source = ScriptedSource::default().with("Main Thread", vec![]);
        let mut agg = MetricsAggregator::new();
        let err = agg
            .start(0, &[ChannelRequest::new("CPU Main", ["Main Thread"])], &source)
            .unwrap_err();
        assert!(matches!(err, OverlayError::InvalidWindow(0)));
        assert_eq!(source.opened.load(Ordering::SeqCst), 0);
        assert!(!agg.is_running());
    }

    #[test]
    fn stop_releases_feeds_and_reports_unavailable() {
        let source = ScriptedSource::default()
            .with("Main Thread", vec![vec![3_000_000], vec![4_000_000]])
            .with("Render Thread", vec![vec![1_000_000]]);
        let requests = [
            ChannelRequest::new("CPU Main", ["Main Thread"]),
            ChannelRequest::new("Render Thread", ["Render Thread"]),
        ];
        let mut agg = started(4, &requests, &source);
        agg.record_frame(16.0);
        agg.poll();

        agg.stop();
        assert_eq!(source.closed.load(Ordering::SeqCst), 2);

        agg.record_frame(16.0);
        agg.poll();
        let snap = agg.snapshot();
        assert_eq!(snap.fps, Reading::Unavailable);
        assert_eq!(snap.frame_time_ms, Reading::Unavailable);
        assert!(snap.channels.iter().all(|c| c.reading == Reading::Unavailable));

        agg.stop();
        assert_eq!(source.closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn restart_replaces_previous_feeds() {
        let source = ScriptedSource::default().with("Main Thread", vec![vec![1]]);
        let requests = [ChannelRequest::new("CPU Main", ["Main Thread"])];
        let mut agg = started(4, &requests, &source);
        agg.start(8, &requests, &source).unwrap();
        assert_eq!(source.opened.load(Ordering::SeqCst), 2);
        assert_eq!(source.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_feeds() {
        let source = ScriptedSource::default().with("Main Thread", vec![]);
        {
            let _agg = started(4, &[ChannelRequest::new("CPU Main", ["Main Thread"])], &source);
        }
        assert_eq!(source.closed.load(Ordering::SeqCst), 1);
    }
}
