//! Platform capabilities: blocking delay, sensor and battery readers
//!
//! Hardware callbacks are expressed as small traits with blanket closure
//! impls, so tests and simulators can supply synthetic readings.

use std::thread;
use std::time::Duration;

/// Platform delay primitive
pub trait Platform: Send {
    /// Block the caller for `ms` milliseconds
    fn delay_ms(&mut self, ms: u16);
}

/// Platform backed by `std::thread::sleep`
#[derive(Debug, Default)]
pub struct StdPlatform;

impl Platform for StdPlatform {
    fn delay_ms(&mut self, ms: u16) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Capability producing one sensor reading
///
/// Invoked synchronously on the reply path; a slow reader stalls the whole
/// polling cycle for its node.
pub trait SensorReader: Send {
    /// Take the current reading
    fn read(&mut self) -> f32;
}

impl<F> SensorReader for F
where
    F: FnMut() -> f32 + Send,
{
    fn read(&mut self) -> f32 {
        self()
    }
}

/// Capability producing the current supply voltage in millivolts
pub trait VoltageSource: Send {
    /// Read the supply voltage
    fn read_mv(&mut self) -> u16;
}

impl<F> VoltageSource for F
where
    F: FnMut() -> u16 + Send,
{
    fn read_mv(&mut self) -> u16 {
        self()
    }
}
