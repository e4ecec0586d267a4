pub mod models;
pub mod restful;
pub mod snapshot;

pub use models::*;
pub use snapshot::{DeviceSnapshot, IngestError, ValidationError};
