//! Class-path watcher
//!
//! Watches the reload roots and turns unit file changes into generation
//! rotations. This is the development-time trigger for hot swap; nothing in
//! the loader depends on it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hotframe_kernel::config::{ReloadConfig, WatchConfig};
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{CreateKind, ModifyKind, RemoveKind},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::scope::ReloadableLoaderScope;

/// Watch event kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// A unit file change that survived filtering and debouncing.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
    pub timestamp: Instant,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: PathBuf) -> Self {
        Self {
            kind,
            path,
            timestamp: Instant::now(),
        }
    }
}

/// Per-path debounce window
#[derive(Debug)]
struct Debouncer {
    window: Duration,
    last_events: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_events: HashMap::new(),
        }
    }

    /// `true` if an event for `path` at `now` should pass.
    ///
    /// Entries whose window has closed are dropped on the way.
    fn admit(&mut self, path: &Path, now: Instant) -> bool {
        let window = self.window;
        self.last_events
            .retain(|_, last| now.saturating_duration_since(*last) < window);

        match self.last_events.get(path) {
            Some(last) if now.duration_since(*last) < self.window => false,
            _ => {
                self.last_events.insert(path.to_path_buf(), now);
                true
            }
        }
    }
}

fn classify(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(CreateKind::File) | EventKind::Create(CreateKind::Any) => {
            Some(WatchEventKind::Created)
        }
        EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEventKind::Modified),
        EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
            Some(WatchEventKind::Removed)
        }
        _ => None,
    }
}

/// File watcher over the reload class-path
pub struct ClassPathWatcher {
    roots: Vec<PathBuf>,
    config: WatchConfig,
    event_tx: mpsc::Sender<WatchEvent>,
    event_rx: Option<mpsc::Receiver<WatchEvent>>,
    watcher: Option<RecommendedWatcher>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl ClassPathWatcher {
    pub fn new(roots: Vec<PathBuf>, config: WatchConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1024);

        Self {
            roots,
            config,
            event_tx,
            event_rx: Some(event_rx),
            watcher: None,
            shutdown_tx: None,
        }
    }

    /// Watch the class-path of `config` with its effective watch settings.
    pub fn from_config(config: &ReloadConfig) -> Self {
        Self::new(config.class_path.clone(), config.effective_watch())
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<WatchEvent>> {
        self.event_rx.take()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Start watching. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> Result<(), notify::Error> {
        info!("Starting class-path watcher over {} root(s)", self.roots.len());

        let (raw_tx, mut raw_rx) = mpsc::channel::<Event>(1024);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    let _ = raw_tx.blocking_send(event);
                }
                Err(e) => error!("Class-path watch error: {}", e),
            },
            Config::default().with_poll_interval(Duration::from_millis(100)),
        )?;

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        for root in &self.roots {
            if !root.exists() {
                warn!("Watch root does not exist: {:?}", root);
                continue;
            }
            watcher.watch(root, mode)?;
        }

        self.watcher = Some(watcher);
        self.shutdown_tx = Some(shutdown_tx);

        let event_tx = self.event_tx.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            let mut debouncer = Debouncer::new(config.debounce());
            loop {
                tokio::select! {
                    Some(event) = raw_rx.recv() => {
                        let Some(kind) = classify(&event.kind) else {
                            continue;
                        };
                        for path in event.paths {
                            if !config.should_watch(&path) {
                                continue;
                            }
                            if !debouncer.admit(&path, Instant::now()) {
                                debug!("Debounced event for {:?}", path);
                                continue;
                            }
                            let watch_event = WatchEvent::new(kind.clone(), path);
                            debug!("Watch event: {:?}", watch_event);
                            if event_tx.send(watch_event).await.is_err() {
                                debug!("Watch event receiver dropped");
                                return;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Class-path watcher shutting down");
                        return;
                    }
                    else => return,
                }
            }
        });

        Ok(())
    }

    /// Stop watching
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        self.watcher = None;
    }
}

/// Rotate `scope` once for every received watch event.
///
/// The task ends when the event channel closes. A failed rotation is logged
/// and the previous generation stays active.
pub fn spawn_rotation_task(
    scope: Arc<ReloadableLoaderScope>,
    mut events: mpsc::Receiver<WatchEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Rotating after {:?} of {:?}", event.kind, event.path);
            if let Err(e) = scope.rotate() {
                warn!("Generation rotation after change to {:?} failed: {}", event.path, e);
            }
        }
    })
}
