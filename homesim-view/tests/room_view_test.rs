use std::sync::Arc;
use std::time::Duration;

use homesim_view::document::{Document, MemoryDocument};
use homesim_view::feed::PollingFeed;
use homesim_view::renderer::RoomRenderer;
use homesim_view::source::{DeviceSource, HttpSource};
use homesim_view::view::RoomView;
use tokio::time;

use crate::common::{LAMP_AND_THERMOMETER, MockServer, ScriptedSource};

mod common;

fn view_of<S>(source: Arc<S>) -> RoomView<MemoryDocument, S>
where
    S: DeviceSource + Send + Sync + 'static,
{
    RoomView::new(RoomRenderer::new(MemoryDocument::new()).unwrap(), source)
}

fn has_element<S>(view: &RoomView<MemoryDocument, S>, id: &str) -> bool
where
    S: DeviceSource + Send + Sync + 'static,
{
    view.with_document(|document| document.element_by_id(id).is_some())
}

#[tokio::test]
async fn test_click_flips_locally_even_when_toggle_fails() {
    let (source, mut toggles) = ScriptedSource::new(true);
    source.push(LAMP_AND_THERMOMETER);
    let view = view_of(Arc::new(source));

    view.load().await.unwrap();
    assert_eq!(view.is_activated("lamp"), Some(false));

    assert_eq!(view.click("lamp"), Some(true));
    assert_eq!(view.is_activated("lamp"), Some(true));

    assert_eq!(toggles.recv().await.unwrap(), "lamp");
    assert_eq!(view.is_activated("lamp"), Some(true));
}

#[tokio::test]
async fn test_click_on_unknown_control_sends_nothing() {
    let (source, mut toggles) = ScriptedSource::new(false);
    source.push(LAMP_AND_THERMOMETER);
    let view = view_of(Arc::new(source));
    view.load().await.unwrap();

    assert_eq!(view.click("thermometer"), None);
    assert_eq!(view.click("fridge"), None);

    tokio::task::yield_now().await;
    assert!(toggles.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_fetch_keeps_document() {
    let (source, _toggles) = ScriptedSource::new(false);
    source.push(LAMP_AND_THERMOMETER);
    source.push_error();
    source.push(r#"{ "lamp": { "type": "control", "activated": true, "ui": { "icon": "light", "x": 10, "y": 20 } } }"#);
    let source = Arc::new(source);
    let view = view_of(Arc::clone(&source));

    view.load().await.unwrap();
    let before = view.with_document(MemoryDocument::render_text);

    let failed = source.fetch_devices().await;
    assert!(view.apply(failed).is_none());
    assert_eq!(view.with_document(MemoryDocument::render_text), before);

    let status = view.status();
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_error.unwrap().contains("503"));

    let next = source.fetch_devices().await;
    let report = view.apply(next).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(view.is_activated("lamp"), Some(true));
    assert!(!has_element(&view, "sensor_thermometer"));

    let status = view.status();
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_synced_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_watch_reconciles_on_every_tick() {
    let (source, _toggles) = ScriptedSource::new(false);
    source.push(LAMP_AND_THERMOMETER);
    source.push_error();
    source.push(
        r#"{
            "lamp": { "type": "control", "activated": false, "ui": { "icon": "light", "x": 10, "y": 20 } },
            "thermometer": { "type": "sensor", "data": { "value": 3, "unit": "C" } },
            "fan": { "type": "control", "activated": true, "ui": { "icon": "fan", "x": 50, "y": 50 } }
        }"#,
    );
    let source = Arc::new(source);
    let view = view_of(Arc::clone(&source));

    let feed = PollingFeed::new(source, Duration::from_secs(1));
    let subscription = view.watch(&feed);

    time::sleep(Duration::from_millis(1500)).await;
    assert!(has_element(&view, "control_lamp"));
    assert!(has_element(&view, "sensor_thermometer"));

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(view.status().consecutive_failures, 1);
    assert!(has_element(&view, "control_lamp"));

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(view.is_activated("fan"), Some(true));
    let text = view.with_document(MemoryDocument::render_text);
    assert!(text.contains("3.00"));

    subscription.cancel();
}

#[tokio::test]
async fn test_end_to_end_against_mock() {
    let server = MockServer::start().await;
    let source = Arc::new(HttpSource::new(&server.base_url).unwrap());
    let view = view_of(Arc::clone(&source));

    let report = view.load().await.unwrap();
    assert_eq!(report.created, 14);
    assert_eq!(view.is_activated("heater"), Some(true));
    assert_eq!(view.is_activated("tv"), Some(false));

    assert_eq!(view.click("tv"), Some(true));

    let mut attempts = 0;
    while !server.is_activated("tv").await {
        attempts += 1;
        assert!(attempts < 100, "toggle never reached the mock");
        time::sleep(Duration::from_millis(10)).await;
    }

    let update = source.fetch_devices().await;
    let report = view.apply(update).unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(view.is_activated("tv"), Some(true));
}
