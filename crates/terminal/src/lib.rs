//! Terminal front-end for `perf-overlay`.
//!
//! Owns the main loop and wires together the background tasks:
//! - Metrics monitor (frame timing + counter channels)
//! - Config file watcher (restart the monitor on change)
//! - Ctrl-C handler

use overlay_config::{default_path, load as load_config, ConfigWatcher, OutputFormat, OverlayConfig};
use overlay_core::{event::Message, state::MetricsSnapshot, OverlayError, Result};
use overlay_metrics::{
    spawn_monitor, ChannelRequest, MonitorHandle, MonitorSettings, Recorder, RecorderHub,
    MAIN_THREAD, RENDER_THREAD,
};
use overlay_widgets::Overlay;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// ANSI: clear screen, cursor home.
const CLEAR: &str = "\x1b[2J\x1b[H";

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the overlay until Ctrl-C. `config_path` defaults to
/// [`default_path`].
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    run_until(config_path, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Run the overlay until `shutdown` resolves.
///
/// `shutdown` is created once and polled on every iteration, so a signal
/// delivered while a config reload restarts the monitor is still seen.
pub async fn run_until<F>(config_path: Option<PathBuf>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let path = config_path.unwrap_or_else(default_path);
    let config = match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("{e}; using defaults");
            OverlayConfig::default()
        }
    };

    let mut app = App::new(config);
    app.start_monitor()?;

    let (_watcher, mut config_rx) = ConfigWatcher::spawn(&path);
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            biased;
            () = &mut shutdown => Message::Shutdown,
            snapshot = app.next_snapshot() => match snapshot {
                Some(s) => Message::Snapshot(s),
                None => {
                    error!("metrics monitor stopped unexpectedly");
                    Message::Shutdown
                }
            },
            Some(()) = config_rx.recv() => Message::ConfigReloaded,
        };

        if let Message::Shutdown = message {
            break;
        }

        // A signal arriving during the update stays latched in `shutdown`
        // and wins the next select.
        app.update(message, &path).await?;
    }

    app.stop_monitor().await;
    info!("perf-overlay exiting");
    Ok(())
}

// ── State ─────────────────────────────────────────────────────────────────────

struct App {
    config:    OverlayConfig,
    overlay:   Overlay,
    hub:       RecorderHub,
    main:      Recorder,
    render:    Recorder,
    monitor:   Option<MonitorHandle>,
    last_draw: Option<Instant>,
}

impl App {
    fn new(config: OverlayConfig) -> Self {
        // The terminal has no GPU timer; only the two in-process counters exist.
        let hub = RecorderHub::new();
        let main = hub.recorder(MAIN_THREAD);
        let render = hub.recorder(RENDER_THREAD);

        Self {
            overlay: Overlay::from_config(&config.lines),
            config,
            hub,
            main,
            render,
            monitor: None,
            last_draw: None,
        }
    }

    fn start_monitor(&mut self) -> Result<()> {
        let channels: Vec<ChannelRequest> =
            self.config.channels.iter().map(ChannelRequest::from).collect();
        let handle = spawn_monitor(
            MonitorSettings::from(&self.config.sampling),
            &channels,
            &self.hub,
            Some(self.main.clone()),
        )?;

        for status in handle.statuses() {
            info!("{status}");
        }
        self.monitor = Some(handle);
        Ok(())
    }

    async fn stop_monitor(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.stop().await;
        }
    }

    async fn next_snapshot(&mut self) -> Option<MetricsSnapshot> {
        match self.monitor.as_mut() {
            Some(handle) => handle.recv().await,
            None => std::future::pending().await,
        }
    }

    // ── Update ────────────────────────────────────────────────────────────────

    async fn update(&mut self, message: Message, path: &Path) -> Result<()> {
        match message {
            Message::Snapshot(snapshot) => self.draw(&snapshot)?,
            Message::ConfigReloaded => match load_config(path) {
                Ok(cfg) if cfg == self.config => info!("Config unchanged"),
                Ok(cfg) => {
                    info!("Config reloaded; restarting monitor");
                    self.stop_monitor().await;
                    self.overlay = Overlay::from_config(&cfg.lines);
                    self.config = cfg;
                    self.last_draw = None;
                    self.start_monitor()?;
                }
                Err(e) => warn!("Config reload failed: {e}"),
            },
            Message::Shutdown => {}
        }
        Ok(())
    }

    // ── View ──────────────────────────────────────────────────────────────────

    fn draw(&mut self, snapshot: &MetricsSnapshot) -> Result<()> {
        let refresh = Duration::from_millis(self.config.output.refresh_ms);
        if self.last_draw.is_some_and(|t| t.elapsed() < refresh) {
            return Ok(());
        }
        self.last_draw = Some(Instant::now());

        let _timer = self.render.scope();
        let frame = match self.config.output.format {
            OutputFormat::Text => format!(
                "{CLEAR}perf-overlay  {}\n\n{}\n",
                snapshot.taken_at.format("%H:%M:%S"),
                self.overlay.render(snapshot)
            ),
            OutputFormat::Json => {
                let line = serde_json::to_string(snapshot)
                    .map_err(|e| OverlayError::Render(format!("JSON encode failed: {e}")))?;
                line + "\n"
            }
        };

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}
