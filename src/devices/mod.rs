mod registry;

pub use registry::{DeviceLookup, NewDevice, PgDeviceRegistry};

#[cfg(test)]
pub use registry::MockDeviceLookup;
