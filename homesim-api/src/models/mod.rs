mod control;
mod device;
mod sensor;

pub use control::*;
pub use device::*;
pub use sensor::*;

/// Identifier of a simulated device, unique within one `/devices` response.
pub type DeviceId = String;
