//! In-process timing counters.
//!
//! Producers hold a [`Recorder`] and report durations under a counter name;
//! the aggregator opens the same name through the [`RecorderHub`]'s
//! [`FeedSource`] impl. Nothing is buffered while no feed is open.

use crate::feed::{CounterFeed, FeedSource};
use overlay_core::{OverlayError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Buffer {
    /// `Some(capacity)` while a feed is open.
    open:    Option<usize>,
    samples: VecDeque<u64>,
    dropped: u64,
}

#[derive(Debug, Default)]
struct Counter {
    buffer: Mutex<Buffer>,
}

impl Counter {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        // A producer that panicked mid-push leaves the buffer structurally valid.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of named timing counters.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct RecorderHub {
    counters: Arc<Mutex<HashMap<String, Arc<Counter>>>>,
}

impl RecorderHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer handle for `name`, registering the counter on first use.
    pub fn recorder(&self, name: &str) -> Recorder {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(name.to_string()).or_default();
        Recorder {
            counter: Arc::clone(counter),
        }
    }

    /// Whether a feed is currently open on `name`.
    pub fn is_open(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.lock().open.is_some())
    }

    fn get(&self, name: &str) -> Option<Arc<Counter>> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl FeedSource for RecorderHub {
    fn open(&self, counter: &str, capacity: usize) -> Result<Box<dyn CounterFeed>> {
        let handle = self
            .get(counter)
            .ok_or_else(|| OverlayError::Feed(format!("no counter named '{counter}'")))?;

        {
            let mut buffer = handle.lock();
            if buffer.open.is_some() {
                return Err(OverlayError::Feed(format!("counter '{counter}' is already open")));
            }
            buffer.open = Some(capacity.max(1));
            buffer.samples.clear();
            buffer.dropped = 0;
        }

        Ok(Box::new(RecorderFeed {
            name:    counter.to_string(),
            counter: Some(handle),
        }))
    }
}

/// Producer side of a counter.
#[derive(Debug, Clone)]
pub struct Recorder {
    counter: Arc<Counter>,
}

impl Recorder {
    /// Record one duration. Discarded while no feed is open; when the feed's
    /// buffer is full the oldest sample is dropped.
    pub fn record(&self, elapsed: Duration) {
        let mut buffer = self.counter.lock();
        let Some(capacity) = buffer.open else {
            return;
        };
        if buffer.samples.len() == capacity {
            buffer.samples.pop_front();
            buffer.dropped += 1;
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        buffer.samples.push_back(nanos);
    }

    /// Time the rest of the current scope.
    pub fn scope(&self) -> ScopeTimer<'_> {
        ScopeTimer {
            recorder: self,
            started:  Instant::now(),
        }
    }
}

/// Records the time between its creation and drop.
#[must_use = "the timer records when dropped"]
#[derive(Debug)]
pub struct ScopeTimer<'a> {
    recorder: &'a Recorder,
    started:  Instant,
}

impl Drop for ScopeTimer<'_> {
    fn drop(&mut self) {
        self.recorder.record(self.started.elapsed());
    }
}

/// Consumer side of a counter, handed out by [`RecorderHub::open`](FeedSource::open).
#[derive(Debug)]
struct RecorderFeed {
    name:    String,
    /// `None` once closed.
    counter: Option<Arc<Counter>>,
}

impl CounterFeed for RecorderFeed {
    fn drain(&mut self, out: &mut Vec<u64>) {
        let Some(counter) = &self.counter else {
            return;
        };
        let mut buffer = counter.lock();
        if buffer.dropped > 0 {
            tracing::trace!(counter = %self.name, dropped = buffer.dropped, "recorder buffer overflowed");
            buffer.dropped = 0;
        }
        out.extend(buffer.samples.drain(..));
    }

    fn close(&mut self) {
        if let Some(counter) = self.counter.take() {
            let mut buffer = counter.lock();
            buffer.open = None;
            buffer.samples.clear();
        }
    }
}

impl Drop for RecorderFeed {
    fn drop(&mut self) {
        self.close();
    }
}
