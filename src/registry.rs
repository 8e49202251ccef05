//! Server-side records of discovered nodes

use crate::protocol::{SensorType, MAX_SENSORS};

/// Immutable snapshot of one node's HELLO announcement
///
/// Owned by the server application, which decides when to discard or
/// replace it (e.g. on a newer HELLO from a different address, or after a
/// full poll cycle completes). Exactly one record is live at a time in the
/// reference deployment, but nothing here enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRecord {
    /// Transport address the HELLO originated from
    pub address: u16,
    /// Advertised supply voltage in millivolts
    pub battery_mv: u16,
    /// Number of populated sensor slots
    pub sensor_count: u8,
    /// Sensor slots in the node's registration order
    pub sensors: [SensorType; MAX_SENSORS],
}

impl NodeRecord {
    /// Iterate over the advertised sensors (populated slots only)
    pub fn advertised(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.sensors.iter().copied().take(self.sensor_count as usize)
    }
}

/// One decoded REPLY payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Sensor that was read
    pub sensor: SensorType,
    /// Measured value
    pub value: f32,
}
