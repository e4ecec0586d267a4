use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::ValidationError;

use super::DeviceId;

/// Class names the room view sets on control elements itself; an icon may not reuse them.
pub const RESERVED_ICON_NAMES: [&str; 4] = ["control", "sensor", "activated", "stale"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Icon name, applied as a style class
    pub icon: String,
    /// Horizontal offset in percent of the room surface
    pub x: f64,
    /// Vertical offset in percent of the room surface
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Amount added to the target sensor
    pub value: f64,
    /// Applied once on (de)activation instead of on every simulation tick
    pub instant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Current switch state
    pub activated: bool,
    /// Position and icon on the floor plan
    pub ui: Placement,
    /// Influence on sensors, keyed by sensor id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effect: BTreeMap<DeviceId, Effect>,
}

impl Control {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ui.icon.trim().is_empty() {
            return Err(ValidationError::EmptyIcon);
        }
        if self.ui.icon.chars().any(char::is_whitespace)
            || RESERVED_ICON_NAMES.contains(&self.ui.icon.as_str())
        {
            return Err(ValidationError::InvalidIcon(self.ui.icon.clone()));
        }

        for (axis, value) in [("x", self.ui.x), ("y", self.ui.y)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PositionOutOfRange { axis, value });
            }
        }

        for (sensor, effect) in &self.effect {
            if !effect.value.is_finite() {
                return Err(ValidationError::NonFiniteValue(format!("effect on {sensor}")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(x: f64, y: f64) -> Control {
        Control {
            activated: false,
            ui: Placement {
                icon: "light".to_string(),
                x,
                y,
            },
            effect: BTreeMap::new(),
        }
    }

    #[test]
    fn test_position_bounds_are_inclusive() {
        assert!(control(0.0, 100.0).validate().is_ok());
        assert!(control(100.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_position_out_of_range() {
        assert!(matches!(
            control(120.0, 5.0).validate(),
            Err(ValidationError::PositionOutOfRange { axis: "x", .. })
        ));
        assert!(matches!(
            control(5.0, f64::NAN).validate(),
            Err(ValidationError::PositionOutOfRange { axis: "y", .. })
        ));
    }

    #[test]
    fn test_empty_icon() {
        let mut control = control(10.0, 10.0);
        control.ui.icon = "  ".to_string();

        assert!(matches!(control.validate(), Err(ValidationError::EmptyIcon)));
    }

    #[test]
    fn test_icon_must_be_a_single_class_name() {
        for icon in ["ceiling light", "light\t", "\nlight"] {
            let mut control = control(10.0, 10.0);
            control.ui.icon = icon.to_string();

            assert_eq!(control.validate(), Err(ValidationError::InvalidIcon(icon.to_string())));
        }
    }

    #[test]
    fn test_icon_cannot_reuse_view_classes() {
        for icon in RESERVED_ICON_NAMES {
            let mut control = control(10.0, 10.0);
            control.ui.icon = icon.to_string();

            assert!(matches!(control.validate(), Err(ValidationError::InvalidIcon(_))));
        }

        let mut control = control(10.0, 10.0);
        control.ui.icon = "massage_seat".to_string();
        assert!(control.validate().is_ok());
    }
}
