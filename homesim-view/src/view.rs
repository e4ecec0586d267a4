use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;

use crate::document::Document;
use crate::error::Result;
use crate::feed::{DeviceFeed, FeedUpdate, Subscription};
use crate::renderer::{RenderReport, RoomRenderer};
use crate::source::DeviceSource;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStatus {
    /// Time of the last successfully applied device map
    pub last_synced_at: Option<OffsetDateTime>,
    /// Failed fetches or renders since the last success
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_report: RenderReport,
}

/// The room view: a renderer fed by a device source.
///
/// Cloning is cheap; clones share the same document and source.
pub struct RoomView<D: Document, S> {
    renderer: Arc<Mutex<RoomRenderer<D>>>,
    source: Arc<S>,
    status: Arc<Mutex<SyncStatus>>,
}

impl<D: Document, S> Clone for RoomView<D, S> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            source: Arc::clone(&self.source),
            status: Arc::clone(&self.status),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<D, S> RoomView<D, S>
where
    D: Document + Send + 'static,
    D::Node: Send,
    S: DeviceSource + Send + Sync + 'static,
{
    pub fn new(renderer: RoomRenderer<D>, source: Arc<S>) -> Self {
        Self {
            renderer: Arc::new(Mutex::new(renderer)),
            source,
            status: Arc::new(Mutex::new(SyncStatus::default())),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Fetch the device map once and render it into the empty containers.
    pub async fn load(&self) -> Result<RenderReport> {
        let result = match self.source.fetch_devices().await {
            Ok(snapshot) => lock(&self.renderer).initial_render(&snapshot),
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => {
                tracing::info!(devices = report.created, "Room rendered");
                self.record_success(report);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!("Initial render failed: {}", e);
                self.record_failure(e.to_string());
                Err(e)
            }
        }
    }

    /// Apply one feed update. Failures are logged and leave the document untouched.
    pub fn apply(&self, update: FeedUpdate) -> Option<RenderReport> {
        let result = update.and_then(|snapshot| lock(&self.renderer).reconcile(&snapshot));

        match result {
            Ok(report) => {
                tracing::debug!(
                    created = report.created,
                    updated = report.updated,
                    removed = report.removed,
                    retained = report.retained,
                    "Room reconciled"
                );
                self.record_success(report);
                Some(report)
            }
            Err(e) => {
                tracing::warn!("Error fetching devices: {}", e);
                self.record_failure(e.to_string());
                None
            }
        }
    }

    /// Click on a control: flip it locally and fire a toggle request without waiting for it.
    ///
    /// Returns the new local state, or `None` when the control is not rendered.
    pub fn click(&self, device_id: &str) -> Option<bool> {
        let state = match lock(&self.renderer).toggle_local(device_id) {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!(device = %device_id, "Click on unknown control ignored");
                return None;
            }
            Err(e) => {
                tracing::warn!(device = %device_id, "Failed to flip control: {}", e);
                return None;
            }
        };

        let source = Arc::clone(&self.source);
        let device_id = device_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = source.toggle(&device_id).await {
                tracing::warn!(device = %device_id, "Toggle request failed: {}", e);
            }
        });

        Some(state)
    }

    /// Subscribe to `feed`, reconciling on every update.
    pub fn watch<F: DeviceFeed + ?Sized>(&self, feed: &F) -> Subscription {
        let view = self.clone();
        feed.subscribe(Arc::new(move |update: FeedUpdate| {
            view.apply(update);
        }))
    }

    pub fn status(&self) -> SyncStatus {
        lock(&self.status).clone()
    }

    pub fn is_activated(&self, device_id: &str) -> Option<bool> {
        lock(&self.renderer).is_activated(device_id)
    }

    /// Run `f` against the current document.
    pub fn with_document<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(lock(&self.renderer).document())
    }

    fn record_success(&self, report: RenderReport) {
        let mut status = lock(&self.status);
        status.last_synced_at = Some(OffsetDateTime::now_utc());
        status.consecutive_failures = 0;
        status.last_error = None;
        status.last_report = report;
    }

    fn record_failure(&self, error: String) {
        let mut status = lock(&self.status);
        status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        status.last_error = Some(error);
    }
}
