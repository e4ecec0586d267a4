#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use homesim_api::DeviceSnapshot;
use homesim_api::restful::{DEVICES_PATH, toggle_segments};
use reqwest::{Client, Response, Url};

use super::DeviceSource;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    /// Create a source whose requests give up after the given timeouts
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_timeouts(base_url: &str, request: Duration, connect: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request)
            .connect_timeout(connect)
            .build()?;

        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{base_url}: not a base url")));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base url, percent-encoding each of them.
    ///
    /// Empty, `.` and `..` segments are refused since url normalisation would
    /// drop or resolve them and address a different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(Error::InvalidUrl(format!(
                "{segment:?} is not a valid path segment"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{}: not a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(Error::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl DeviceSource for HttpSource {
    async fn fetch_devices(&self) -> Result<DeviceSnapshot> {
        let url = self.endpoint(&[DEVICES_PATH])?;
        let body = self.get(url).await?.bytes().await?;

        let snapshot = DeviceSnapshot::from_slice(&body)?;
        for (id, reason) in snapshot.rejected() {
            tracing::warn!(device = %id, "Rejected device record: {}", reason);
        }

        Ok(snapshot)
    }

    async fn toggle(&self, device_id: &str) -> Result<()> {
        let url = self.endpoint(&toggle_segments(device_id))?;
        self.get(url).await?;
        Ok(())
    }
}
