use serde::{Deserialize, Serialize};

use crate::models::Device;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceUpdateResponse {
    /// Human readable outcome
    pub message: String,
    /// The device after the update
    pub device: Device,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
