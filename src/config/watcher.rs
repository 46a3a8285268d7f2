//! Polling reload supervisor.
//!
//! Each tick stats the candidate files. When any was added, removed or modified, the
//! current record is copied, the copy is resolved through the full pipeline and, if that
//! succeeds, published. A failed reload keeps the previous record and stamps, so the next
//! tick retries against the same baseline.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::bind::Settings;
use crate::config::live::Live;
use crate::config::loader::Loader;
use crate::error::BindResult;
use crate::lifecycle::Shutdown;
use crate::source::FileStamps;

type ChangeCallback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Owns a live record and keeps it in sync with its configuration files.
pub struct Supervisor<T> {
    loader: Arc<Loader>,
    files: Vec<PathBuf>,
    live: Live<T>,
    stamps: Mutex<FileStamps>,
    on_change: Option<ChangeCallback<T>>,
}

impl<T: Settings> Supervisor<T> {
    /// Resolve `record` once and publish it. Errors from this first load are returned as is.
    pub fn start<P: AsRef<Path>>(loader: Arc<Loader>, mut record: T, files: &[P]) -> BindResult<Self> {
        let files: Vec<PathBuf> = files.iter().map(|f| f.as_ref().to_path_buf()).collect();
        let stamps = loader.resolve(&mut record, &files)?;
        tracing::info!(files = stamps.len(), "Configuration loaded");

        Ok(Self {
            loader,
            files,
            live: Live::new(record),
            stamps: Mutex::new(stamps),
            on_change: None,
        })
    }

    /// Call `callback` with the new record after every successful reload.
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// A handle readers can keep; it always loads the latest published record.
    pub fn live(&self) -> Live<T> {
        self.live.clone()
    }

    pub fn current(&self) -> Arc<T> {
        self.live.load()
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Run one tick. Returns whether a new record was published.
    pub fn poll(&self) -> BindResult<bool> {
        let candidates = self.loader.candidate_files(&self.files);
        let mut stamps = self.stamps.lock().unwrap_or_else(PoisonError::into_inner);
        if !candidates.changed_since(&stamps) {
            return Ok(false);
        }

        tracing::info!(files = candidates.len(), "Configuration files changed, reloading");
        let mut next = T::clone(&self.live.load());
        if let Err(err) = self.loader.resolve_with(&mut next, &candidates) {
            tracing::error!(error = %err, "Failed to reload configuration. Keeping current configuration.");
            self.loader
                .log(Some(&err), format_args!("Failed to reload configuration from {:?}", self.files));
            return Err(err);
        }

        let next = Arc::new(next);
        self.live.store(Arc::clone(&next));
        *stamps = candidates;
        drop(stamps);

        self.loader
            .log(None, format_args!("Configuration reloaded from {:?}", self.files));
        if let Some(callback) = &self.on_change {
            callback(&next);
        }
        Ok(true)
    }

    /// Poll on the loader's reload interval until `shutdown` fires.
    pub fn spawn(self: Arc<Self>, shutdown: &Shutdown) -> JoinHandle<()> {
        let mut stop = shutdown.subscribe();
        let period = self.loader.options().reload_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the initial load already happened.
            ticker.tick().await;
            tracing::info!(interval = ?period, "Configuration reload supervisor started");

            loop {
                tokio::select! {
                    _ = stop.recv() => break,
                    _ = ticker.tick() => {
                        // Stat, read and decode are blocking file I/O.
                        let this = Arc::clone(&self);
                        // Reload failures are logged inside poll and retried next tick.
                        if let Err(err) = tokio::task::spawn_blocking(move || this.poll()).await {
                            tracing::error!(error = %err, "Configuration poll task failed");
                        }
                    }
                }
            }
            tracing::info!("Configuration reload supervisor stopped");
        })
    }

    /// Spawn the poll task only when `auto_reload` is enabled in the loader options.
    pub fn spawn_if_enabled(self: Arc<Self>, shutdown: &Shutdown) -> Option<JoinHandle<()>> {
        self.loader
            .options()
            .auto_reload
            .then(|| self.spawn(shutdown))
    }
}
