mod device;

pub use device::*;

/// Path of the full device map.
pub const DEVICES_PATH: &str = "devices";

/// Path segments addressing a single device, relative to the API root.
pub fn device_segments(id: &str) -> [&str; 2] {
    ["device", id]
}

/// Path segments of the fire-and-forget toggle action.
pub fn toggle_segments(id: &str) -> [&str; 3] {
    ["device", id, "toggle"]
}

/// Path segments of the partial update action.
pub fn set_segments(id: &str) -> [&str; 3] {
    ["device", id, "set"]
}

/// Path segments of the idempotent power actions.
pub fn power_segments(id: &str, on: bool) -> [&str; 3] {
    ["device", id, if on { "turn-on" } else { "turn-off" }]
}
