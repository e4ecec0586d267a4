pub mod document;
pub mod error;
pub mod popup;
pub mod renderer;
pub mod source;

#[cfg(not(target_arch = "wasm32"))]
pub mod feed;
#[cfg(not(target_arch = "wasm32"))]
pub mod settings;
#[cfg(not(target_arch = "wasm32"))]
pub mod view;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod web;

pub use error::{Error, Result};

#[cfg(not(target_arch = "wasm32"))]
pub use headless::run;

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::sync::Arc;

    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::document::MemoryDocument;
    use crate::error::Result;
    use crate::feed::{DeviceFeed, FeedUpdate, PollingFeed};
    use crate::renderer::RoomRenderer;
    use crate::settings::Settings;
    use crate::source::HttpSource;
    use crate::view::RoomView;

    /// Headless room view: polls the backend, logs the document after every
    /// structural change and toggles the controls whose ids are typed on stdin.
    pub async fn run(settings: &Settings) -> Result<()> {
        let source = Arc::new(HttpSource::with_timeouts(
            &settings.backend.base_url,
            settings.request_timeout(),
            settings.connect_timeout(),
        )?);
        let view = RoomView::new(RoomRenderer::new(MemoryDocument::new())?, Arc::clone(&source));

        tracing::info!("polling {} every {:?}", source.base_url(), settings.poll_interval());

        if view.load().await.is_ok() {
            tracing::info!("\n{}", view.with_document(MemoryDocument::render_text));
        }

        let feed = PollingFeed::new(source, settings.poll_interval());
        let subscription = feed.subscribe({
            let view = view.clone();
            Arc::new(move |update: FeedUpdate| {
                if let Some(report) = view.apply(update) {
                    if report.changed_structure() {
                        tracing::info!("\n{}", view.with_document(MemoryDocument::render_text));
                    }
                }
            })
        });

        let clicks = tokio::spawn({
            let view = view.clone();
            async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let device_id = line.trim();
                    if device_id.is_empty() {
                        continue;
                    }
                    match view.click(device_id) {
                        Some(state) => tracing::info!(device = %device_id, activated = state, "Toggled"),
                        None => tracing::warn!(device = %device_id, "No such control"),
                    }
                }
            }
        });

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }

        tracing::info!("shutting down");
        subscription.cancel();
        clicks.abort();

        Ok(())
    }
}
