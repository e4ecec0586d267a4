use std::error::Error;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub tick_ms: u64,
    /// Standard deviation of the gaussian noise added to every sensor per tick, 0 disables it
    #[serde(default)]
    pub noise_std_dev: f64,
}

impl Simulation {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub server: Server,
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::from_toml(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))
    }

    pub fn from_toml(source: &str) -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(source)?;

        if settings.simulation.tick_ms == 0 {
            return Err("simulation.tick_ms must be positive".into());
        }
        if !settings.simulation.noise_std_dev.is_finite() || settings.simulation.noise_std_dev < 0.0 {
            return Err("simulation.noise_std_dev must be a non-negative number".into());
        }

        Ok(settings)
    }
}
