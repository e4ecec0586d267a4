use std::time::Duration;

use homesim_view::Error;
use homesim_view::source::{DeviceSource, HttpSource};
use tokio::net::TcpListener;

use crate::common::MockServer;

mod common;

#[tokio::test]
async fn test_fetch_devices_from_mock() {
    let server = MockServer::start().await;
    let source = HttpSource::new(&server.base_url).unwrap();

    let snapshot = source.fetch_devices().await.unwrap();

    assert_eq!(snapshot.len(), 14);
    assert!(snapshot.rejected().is_empty());
    assert_eq!(
        snapshot.get("temperature_sensor").and_then(|d| d.as_sensor()).unwrap().data.unit,
        "C"
    );
}

#[tokio::test]
async fn test_toggle_reaches_mock() {
    let server = MockServer::start().await;
    let source = HttpSource::new(&server.base_url).unwrap();

    assert!(!server.is_activated("tv").await);
    source.toggle("tv").await.unwrap();
    assert!(server.is_activated("tv").await);

    let snapshot = source.fetch_devices().await.unwrap();
    assert!(snapshot.get("tv").and_then(|d| d.as_control()).unwrap().activated);
}

#[tokio::test]
async fn test_unknown_device_is_a_status_error() {
    let server = MockServer::start().await;
    let source = HttpSource::new(&server.base_url).unwrap();

    match source.toggle("garage").await {
        Err(Error::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/device/garage/toggle"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpSource::with_timeouts(
        &format!("http://{address}"),
        Duration::from_secs(2),
        Duration::from_secs(1),
    )
    .unwrap();

    assert!(matches!(source.fetch_devices().await, Err(Error::Network(_))));
}
