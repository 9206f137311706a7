use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Bursts of filesystem events closer together than this are reported once.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches the overlay config file and sends one notification per burst of
/// writes.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by rename-and-replace (and a file created after startup) are
/// still picked up.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// use overlay_config::ConfigWatcher;
///
/// let (_watcher, mut rx) = ConfigWatcher::spawn("/home/user/.config/perf-overlay/overlay.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed — restarting monitor");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().map(ToOwned::to_owned);

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!("Cannot watch '{}' ({e}); live reload disabled", dir.display());
        return;
    }

    info!("Watching config file: {}", path.display());

    while let Some(event) = sync_rx.recv().await {
        let event = match event {
            Ok(e) => e,
            Err(e) => {
                warn!("Watcher error: {e}");
                continue;
            }
        };

        use notify::EventKind::*;
        let touches_config = event
            .paths
            .iter()
            .any(|p| p.file_name() == file_name.as_deref());
        if !touches_config || !matches!(event.kind, Modify(_) | Create(_)) {
            continue;
        }

        // Let the writer finish, then swallow the rest of the burst.
        tokio::time::sleep(DEBOUNCE).await;
        let mut coalesced = 0usize;
        while sync_rx.try_recv().is_ok() {
            coalesced += 1;
        }
        debug!(coalesced, "config change detected");

        if tx.send(()).await.is_err() {
            break; // receiver dropped
        }
    }
}
