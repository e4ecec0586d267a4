mod http;

pub use http::HttpSource;

use homesim_api::DeviceSnapshot;

use crate::error::Result;

/// Where the room view gets its device map from and sends toggles to.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait DeviceSource {
    /// Fetch the complete, validated device map
    async fn fetch_devices(&self) -> Result<DeviceSnapshot>;

    /// Ask the backend to flip a control; the response body is ignored
    async fn toggle(&self, device_id: &str) -> Result<()>;
}
