use std::collections::BTreeMap;
use std::sync::Arc;

use homesim_api::{Device, DeviceId, DeviceKind, DeviceSnapshot, IngestError, ValidationError};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::settings::Simulation;

pub type SharedHome = Arc<RwLock<Home>>;

const DEFAULT_HOME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../configs/home.json"));

#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device {0} is a {1}, only controls can be toggled")]
    NotAControl(DeviceId, DeviceKind),

    #[error("Device {id} is a {current}, it cannot become a {requested}")]
    KindChange {
        id: DeviceId,
        current: DeviceKind,
        requested: DeviceKind,
    },

    #[error("Update must be a JSON object")]
    InvalidPatch,

    #[error("Invalid device: {0}")]
    InvalidDevice(#[from] ValidationError),

    #[error("Invalid home definition: {0}")]
    InvalidHome(#[from] IngestError),

    #[error("Invalid home definition, device {0}: {1}")]
    RejectedDevice(DeviceId, ValidationError),
}

/// The simulated home: every device by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Home {
    devices: BTreeMap<DeviceId, Device>,
}

impl Home {
    /// The home shipped with the simulator.
    pub fn bundled() -> Result<Self, HomeError> {
        Self::from_json(DEFAULT_HOME)
    }

    /// Parse a home definition; unlike the view, any invalid record is fatal.
    pub fn from_json(source: &str) -> Result<Self, HomeError> {
        let snapshot: DeviceSnapshot = source.parse()?;
        if let Some((id, reason)) = snapshot.rejected().iter().next() {
            return Err(HomeError::RejectedDevice(id.clone(), reason.clone()));
        }

        Ok(Self {
            devices: snapshot.into_devices(),
        })
    }

    pub fn devices(&self) -> &BTreeMap<DeviceId, Device> {
        &self.devices
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Shallow-merge `patch` into the stored record.
    ///
    /// The merged record must still decode and validate, otherwise the
    /// device is left untouched.
    pub fn update(&mut self, id: &str, patch: Value) -> Result<Device, HomeError> {
        let current = self.devices.get(id).ok_or(HomeError::DeviceNotFound)?;
        let Value::Object(patch) = patch else {
            return Err(HomeError::InvalidPatch);
        };

        let mut record = match serde_json::to_value(current) {
            Ok(Value::Object(record)) => record,
            Ok(_) => return Err(ValidationError::Malformed("record is not an object".into()).into()),
            Err(e) => return Err(ValidationError::Malformed(e.to_string()).into()),
        };
        record.extend(patch);

        let device: Device = serde_json::from_value(Value::Object(record))
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        device.validate()?;
        if device.kind() != current.kind() {
            return Err(HomeError::KindChange {
                id: id.to_string(),
                current: current.kind(),
                requested: device.kind(),
            });
        }

        tracing::debug!(device = %id, "Device updated");
        self.devices.insert(id.to_string(), device.clone());
        Ok(device)
    }

    /// Flip a control and apply its instant effects.
    pub fn toggle(&mut self, id: &str) -> Result<Device, HomeError> {
        let on = match self.devices.get(id) {
            Some(Device::Control(control)) => !control.activated,
            Some(device) => return Err(HomeError::NotAControl(id.to_string(), device.kind())),
            None => return Err(HomeError::DeviceNotFound),
        };
        self.set_power(id, on)
    }

    /// Switch a control on or off.
    ///
    /// Instant effects are applied only when the state actually changes, so
    /// repeating the same command is a no-op.
    pub fn set_power(&mut self, id: &str, on: bool) -> Result<Device, HomeError> {
        let device = self.devices.get_mut(id).ok_or(HomeError::DeviceNotFound)?;
        let Device::Control(control) = device else {
            return Err(HomeError::NotAControl(id.to_string(), device.kind()));
        };
        if control.activated == on {
            return Ok(device.clone());
        }

        control.activated = on;
        let sign = if on { 1.0 } else { -1.0 };
        let instant: Vec<(DeviceId, f64)> = control
            .effect
            .iter()
            .filter(|(_, effect)| effect.instant)
            .map(|(sensor, effect)| (sensor.clone(), sign * effect.value))
            .collect();
        let switched = device.clone();

        for (sensor, delta) in instant {
            self.shift_sensor(&sensor, delta);
        }

        tracing::debug!(device = %id, activated = on, "Device switched");
        Ok(switched)
    }

    /// Advance one simulation step: every active control pushes its gradual effects.
    pub fn tick(&mut self) {
        let gradual: Vec<(DeviceId, f64)> = self
            .devices
            .values()
            .filter_map(Device::as_control)
            .filter(|control| control.activated)
            .flat_map(|control| control.effect.iter())
            .filter(|(_, effect)| !effect.instant)
            .map(|(sensor, effect)| (sensor.clone(), effect.value))
            .collect();

        for (sensor, delta) in gradual {
            self.shift_sensor(&sensor, delta);
        }
    }

    /// Add one noise sample to every sensor.
    pub fn perturb<R: Rng + ?Sized>(&mut self, noise: &Normal<f64>, rng: &mut R) {
        for device in self.devices.values_mut() {
            if let Device::Sensor(sensor) = device {
                sensor.data.value += noise.sample(rng);
            }
        }
    }

    fn shift_sensor(&mut self, id: &str, delta: f64) {
        match self.devices.get_mut(id) {
            Some(Device::Sensor(sensor)) => sensor.data.value += delta,
            _ => tracing::debug!(sensor = %id, "Effect targets no sensor"),
        }
    }
}

/// Start the background ticker driving gradual effects and noise.
pub fn spawn(home: SharedHome, simulation: &Simulation) -> JoinHandle<()> {
    let period = simulation.tick();
    let noise = match simulation.noise_std_dev {
        std_dev if std_dev > 0.0 => Normal::new(0.0, std_dev)
            .inspect_err(|e| tracing::warn!("Sensor noise disabled: {}", e))
            .ok(),
        _ => None,
    };

    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let mut home = home.write().await;
            home.tick();
            if let Some(noise) = &noise {
                home.perturb(noise, &mut rand::rng());
            }
        }
    })
}
