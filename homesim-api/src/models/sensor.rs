use serde::{Deserialize, Serialize};

use crate::snapshot::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Current measurement
    pub value: f64,
    /// Display unit, e.g. `C`, `%` or `lux`
    pub unit: String,
}

impl Reading {
    /// Value as shown in the sensor table.
    pub fn formatted_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub data: Reading,
}

impl Sensor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.data.value.is_finite() {
            return Err(ValidationError::NonFiniteValue("sensor value".to_string()));
        }

        Ok(())
    }
}
