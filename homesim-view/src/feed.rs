use std::sync::Arc;
use std::time::Duration;

use homesim_api::DeviceSnapshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::Result;
use crate::source::DeviceSource;

pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub type FeedUpdate = Result<DeviceSnapshot>;

pub type OnUpdate = Arc<dyn Fn(FeedUpdate) + Send + Sync>;

/// A stream of device maps, pushed to a subscriber as they arrive.
pub trait DeviceFeed {
    fn subscribe(&self, on_update: OnUpdate) -> Subscription;
}

/// Handle of an active feed subscription; dropping it stops further ticks.
///
/// Requests already in flight are not cancelled and may still deliver.
#[derive(Debug)]
pub struct Subscription {
    ticker: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(ticker: JoinHandle<()>) -> Self {
        Self {
            ticker: Some(ticker),
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticker
            .as_ref()
            .map(|ticker| !ticker.is_finished())
            .unwrap_or(false)
    }

    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Re-fetches the whole device map on a fixed interval.
///
/// Every tick starts its own request. Responses are handed to the subscriber
/// in arrival order, so a slow response may land after a newer one; the next
/// tick corrects it.
pub struct PollingFeed<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S> PollingFeed<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S> DeviceFeed for PollingFeed<S>
where
    S: DeviceSource + Send + Sync + 'static,
{
    fn subscribe(&self, on_update: OnUpdate) -> Subscription {
        let source = Arc::clone(&self.source);
        let period = self.interval;

        let ticker = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let source = Arc::clone(&source);
                let on_update = Arc::clone(&on_update);
                tokio::spawn(async move {
                    let update = source.fetch_devices().await;
                    on_update(update);
                });
            }
        });

        Subscription::new(ticker)
    }
}
