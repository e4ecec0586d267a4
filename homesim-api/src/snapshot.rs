use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;

use crate::models::{Device, DeviceId};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected an object of devices, found {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Device identifier is empty")]
    EmptyId,

    #[error("Malformed device record: {0}")]
    Malformed(String),

    #[error("Icon name is empty")]
    EmptyIcon,

    #[error("Icon {0:?} is not a usable class name")]
    InvalidIcon(String),

    #[error("Position {axis}={value} is outside 0..=100")]
    PositionOutOfRange { axis: &'static str, value: f64 },

    #[error("Non-finite {0}")]
    NonFiniteValue(String),
}

/// One validated `/devices` response.
///
/// Records that fail to decode or validate are kept apart in `rejected` so
/// that a single bad record never reaches the view, and never makes the view
/// forget what it last rendered for that id either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    devices: BTreeMap<DeviceId, Device>,
    rejected: BTreeMap<DeviceId, ValidationError>,
}

impl DeviceSnapshot {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IngestError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    pub fn from_value(value: Value) -> Result<Self, IngestError> {
        let entries = match value {
            Value::Object(entries) => entries,
            other => return Err(IngestError::NotAnObject(json_kind(&other))),
        };

        let mut snapshot = Self::default();
        for (id, record) in entries {
            let result = serde_json::from_value::<Device>(record)
                .map_err(|e| ValidationError::Malformed(e.to_string()));
            snapshot.insert(id, result);
        }

        Ok(snapshot)
    }

    fn insert(&mut self, id: DeviceId, device: Result<Device, ValidationError>) {
        let checked = device.and_then(|device| {
            if id.trim().is_empty() {
                return Err(ValidationError::EmptyId);
            }
            device.validate().map(|_| device)
        });

        match checked {
            Ok(device) => {
                self.rejected.remove(&id);
                self.devices.insert(id, device);
            }
            Err(e) => {
                self.devices.remove(&id);
                self.rejected.insert(id, e);
            }
        }
    }

    /// Accepted devices in identifier order.
    pub fn devices(&self) -> &BTreeMap<DeviceId, Device> {
        &self.devices
    }

    pub fn rejected(&self) -> &BTreeMap<DeviceId, ValidationError> {
        &self.rejected
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn into_devices(self) -> BTreeMap<DeviceId, Device> {
        self.devices
    }
}

impl FromStr for DeviceSnapshot {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(serde_json::from_str(s)?)
    }
}

impl<I: Into<DeviceId>> FromIterator<(I, Device)> for DeviceSnapshot {
    fn from_iter<T: IntoIterator<Item = (I, Device)>>(iter: T) -> Self {
        let mut snapshot = Self::default();
        for (id, device) in iter {
            snapshot.insert(id.into(), Ok(device));
        }
        snapshot
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
