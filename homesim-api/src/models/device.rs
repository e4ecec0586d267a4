use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::ValidationError;

use super::{Control, Sensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Interactive, toggleable device
    Control,
    /// Read-only numeric device
    Sensor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceKind::Control => write!(f, "control"),
            DeviceKind::Sensor => write!(f, "sensor"),
        }
    }
}

/// One record of the `/devices` map, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Device {
    Control(Control),
    Sensor(Sensor),
}

impl Device {
    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::Control(_) => DeviceKind::Control,
            Device::Sensor(_) => DeviceKind::Sensor,
        }
    }

    pub fn as_control(&self) -> Option<&Control> {
        match self {
            Device::Control(control) => Some(control),
            Device::Sensor(_) => None,
        }
    }

    pub fn as_sensor(&self) -> Option<&Sensor> {
        match self {
            Device::Sensor(sensor) => Some(sensor),
            Device::Control(_) => None,
        }
    }

    /// Checks the semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Device::Control(control) => control.validate(),
            Device::Sensor(sensor) => sensor.validate(),
        }
    }
}

impl From<Control> for Device {
    fn from(control: Control) -> Self {
        Device::Control(control)
    }
}

impl From<Sensor> for Device {
    fn from(sensor: Sensor) -> Self {
        Device::Sensor(sensor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Placement, Reading};

    #[test]
    fn test_deserialize_control() {
        let device: Device = serde_json::from_value(json!({
            "type": "control",
            "activated": true,
            "ui": { "icon": "heater", "x": 3.5, "y": 71 }
        }))
        .unwrap();

        assert_eq!(device.kind(), DeviceKind::Control);
        let control = device.as_control().unwrap();
        assert!(control.activated);
        assert_eq!(control.ui.icon, "heater");
        assert_eq!(control.ui.y, 71.0);
        assert!(control.effect.is_empty());
    }

    #[test]
    fn test_deserialize_sensor() {
        let device: Device = serde_json::from_value(json!({
            "type": "sensor",
            "data": { "value": 50, "unit": "%" }
        }))
        .unwrap();

        assert_eq!(
            device,
            Device::Sensor(Sensor {
                data: Reading {
                    value: 50.0,
                    unit: "%".to_string(),
                },
            })
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_value::<Device>(json!({
            "type": "thermostat",
            "temperature": 22
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_keeps_type_tag() {
        let device = Device::Control(Control {
            activated: false,
            ui: Placement {
                icon: "tv".to_string(),
                x: 46.0,
                y: 89.4,
            },
            effect: Default::default(),
        });

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["type"], json!("control"));
        assert_eq!(value["ui"]["icon"], json!("tv"));
        assert!(value.get("effect").is_none());
    }
}
