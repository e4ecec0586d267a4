#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use homesim_api::DeviceSnapshot;
use homesim_mock::simulate::{Home, SharedHome};
use homesim_view::source::DeviceSource;
use homesim_view::{Error, Result};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};

/// The bundled simulator served over real HTTP on an ephemeral port.
pub struct MockServer {
    pub base_url: String,
    pub home: SharedHome,
}

impl MockServer {
    pub async fn start() -> Self {
        let home = Arc::new(RwLock::new(Home::bundled().unwrap()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(homesim_mock::serve(listener, Arc::clone(&home)));

        Self {
            base_url: format!("http://{address}"),
            home,
        }
    }

    pub async fn is_activated(&self, id: &str) -> bool {
        self.home
            .read()
            .await
            .get(id)
            .and_then(|device| device.as_control())
            .map(|control| control.activated)
            .unwrap()
    }
}

/// Replays canned `/devices` responses and records toggle requests.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<DeviceSnapshot>>>,
    toggles: mpsc::UnboundedSender<String>,
    fail_toggles: bool,
}

impl ScriptedSource {
    pub fn new(fail_toggles: bool) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (toggles, receiver) = mpsc::unbounded_channel();
        let source = Self {
            responses: Mutex::new(VecDeque::new()),
            toggles,
            fail_toggles,
        };
        (source, receiver)
    }

    pub fn push(&self, json: &str) {
        self.responses.lock().unwrap().push_back(Ok(json.parse().unwrap()));
    }

    pub fn push_error(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::Status {
                status: 503,
                url: "http://backend/devices".to_string(),
            }));
    }
}

#[async_trait::async_trait]
impl DeviceSource for ScriptedSource {
    async fn fetch_devices(&self) -> Result<DeviceSnapshot> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::document("no scripted response left")))
    }

    async fn toggle(&self, device_id: &str) -> Result<()> {
        let _ = self.toggles.send(device_id.to_string());
        if self.fail_toggles {
            return Err(Error::Status {
                status: 500,
                url: format!("http://backend/device/{device_id}/toggle"),
            });
        }
        Ok(())
    }
}

pub const LAMP_AND_THERMOMETER: &str = r#"{
    "lamp": { "type": "control", "activated": false, "ui": { "icon": "light", "x": 10, "y": 20 } },
    "thermometer": { "type": "sensor", "data": { "value": 21.5, "unit": "C" } }
}"#;
