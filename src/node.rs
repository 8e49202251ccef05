//! Node role engine
//!
//! Runs on a sensor device: registers sensor sources, announces itself to
//! the coordinator, answers queries and honors sleep commands. Everything is
//! synchronous and attempt-bounded; between attempts the node idles on the
//! platform delay primitive, which is the cheapest correct strategy for a
//! device that is otherwise asleep.

use crate::error::{Error, Result};
use crate::platform::{Platform, SensorReader, VoltageSource};
use crate::protocol::{Message, MessageKind, SensorType, MAX_SENSORS, SERVER_ADDRESS};
use crate::transport::MeshTransport;
use log::{debug, trace, warn};

/// Sleep duration a node starts with before any SLEEP command arrives
pub const DEFAULT_SLEEP_MS: u16 = 1000;

/// One registered sensor: its type tag and the capability that reads it
struct SensorSource {
    sensor: SensorType,
    reader: Box<dyn SensorReader>,
}

/// Result of one [`SnpNode::poll_and_serve`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A SLEEP command arrived; the stored duration was updated
    SleepRequested,
    /// The attempt budget ran out without a SLEEP command
    AttemptsExhausted,
}

/// The sensor node protocol engine
pub struct SnpNode<T: MeshTransport, P: Platform> {
    transport: T,
    platform: P,
    sensors: Vec<SensorSource>,
    sleep_ms: u16,
    voltage: Option<Box<dyn VoltageSource>>,
}

impl<T: MeshTransport, P: Platform> SnpNode<T, P> {
    /// Create a node engine over a transport and platform
    pub fn new(transport: T, platform: P) -> Self {
        Self {
            transport,
            platform,
            sensors: Vec::new(),
            sleep_ms: DEFAULT_SLEEP_MS,
            voltage: None,
        }
    }

    /// Attach a battery voltage source; without one, HELLO reports 0 mV
    pub fn with_voltage_source(mut self, source: impl VoltageSource + 'static) -> Self {
        self.voltage = Some(Box::new(source));
        self
    }

    /// Override the initial sleep duration
    pub fn with_sleep_ms(mut self, sleep_ms: u16) -> Self {
        self.sleep_ms = sleep_ms;
        self
    }

    /// Currently stored sleep duration in milliseconds
    pub fn sleep_ms(&self) -> u16 {
        self.sleep_ms
    }

    /// Register a sensor source, in advertisement order
    ///
    /// Fails with [`Error::SensorCapacity`] beyond [`MAX_SENSORS`] without
    /// touching the existing list.
    pub fn register_sensor(
        &mut self,
        sensor: SensorType,
        reader: impl SensorReader + 'static,
    ) -> Result<()> {
        if self.sensors.len() >= MAX_SENSORS {
            return Err(Error::SensorCapacity { max: MAX_SENSORS });
        }
        self.sensors.push(SensorSource {
            sensor,
            reader: Box::new(reader),
        });
        Ok(())
    }

    /// Announce this node to the coordinator
    ///
    /// Sends a HELLO, pumps the transport and checks for any pending
    /// traffic, up to `max_attempts` times with `retry_interval_ms` idle
    /// between attempts. Best-effort: arrival of *any* frame ends the loop,
    /// the node cannot tell a server response from unrelated traffic.
    pub fn announce(&mut self, max_attempts: u8, retry_interval_ms: u16) {
        for attempt in 0..max_attempts {
            self.send_hello();
            self.transport.update();
            if self.transport.available() {
                debug!("incoming traffic after announce attempt {}", attempt + 1);
                break;
            }
            self.platform.delay_ms(retry_interval_ms);
        }
    }

    /// Serve queries until a SLEEP command arrives or attempts run out
    ///
    /// Each round pumps the transport and drains every pending frame:
    /// frames not originating from the coordinator are discarded unread, a
    /// QUERY is answered immediately from the matching sensor source, and a
    /// SLEEP stores its duration and ends the run at once, leaving any
    /// further pending frames queued.
    pub fn poll_and_serve(&mut self, max_attempts: u8, retry_interval_ms: u16) -> PollOutcome {
        for attempt in 0..max_attempts {
            self.transport.update();
            while let Some(header) = self.transport.peek() {
                if header.from != SERVER_ADDRESS {
                    trace!("draining frame from foreign address {:#o}", header.from);
                    self.transport.discard();
                    self.transport.update();
                    continue;
                }
                match MessageKind::from_raw(header.kind) {
                    Some(MessageKind::Query) => self.handle_query(),
                    Some(MessageKind::Sleep) => {
                        if self.handle_sleep() {
                            debug!("sleep requested on attempt {}", attempt + 1);
                            return PollOutcome::SleepRequested;
                        }
                    }
                    _ => {
                        trace!("draining kind {:#04x} from server", header.kind);
                        self.transport.discard();
                    }
                }
                self.transport.update();
            }
            self.platform.delay_ms(retry_interval_ms);
        }
        debug!("poll budget of {} attempts exhausted", max_attempts);
        PollOutcome::AttemptsExhausted
    }

    /// Block for the stored sleep duration
    pub fn enter_sleep(&mut self) {
        debug!("entering sleep for {} ms", self.sleep_ms);
        let ms = self.sleep_ms;
        self.platform.delay_ms(ms);
    }

    fn send_hello(&mut self) {
        let battery_mv = self.voltage.as_mut().map_or(0, |v| v.read_mv());
        let mut sensors = [SensorType::NoSensor; MAX_SENSORS];
        for (slot, source) in sensors.iter_mut().zip(self.sensors.iter()) {
            *slot = source.sensor;
        }
        let msg = Message::Hello {
            battery_mv,
            sensor_count: self.sensors.len() as u8,
            sensors,
        };
        if !self
            .transport
            .write(SERVER_ADDRESS, MessageKind::Hello as u8, &msg.encode())
        {
            warn!("transport rejected HELLO");
        }
    }

    fn handle_query(&mut self) {
        let Some((_, payload)) = self.transport.read() else {
            return;
        };
        match Message::decode(MessageKind::Query as u8, &payload) {
            Ok(Message::Query { sensor }) => self.send_value(sensor),
            Ok(_) => {}
            Err(err) => warn!("dropping malformed QUERY: {err}"),
        }
    }

    /// Reply once per registered source matching the queried type. A query
    /// for a type this node never registered sends nothing at all; the
    /// server can only see that as a timeout.
    fn send_value(&mut self, sensor: SensorType) {
        let mut matched = false;
        for source in self.sensors.iter_mut() {
            if source.sensor != sensor {
                continue;
            }
            matched = true;
            let value = source.reader.read();
            debug!("replying {:?} = {}", sensor, value);
            let msg = Message::Reply { sensor, value };
            if !self
                .transport
                .write(SERVER_ADDRESS, MessageKind::Reply as u8, &msg.encode())
            {
                warn!("transport rejected REPLY for {:?}", sensor);
            }
            self.transport.update();
        }
        if !matched {
            debug!("no registered source for {:?}, query ignored", sensor);
        }
    }

    fn handle_sleep(&mut self) -> bool {
        let Some((_, payload)) = self.transport.read() else {
            return false;
        };
        match Message::decode(MessageKind::Sleep as u8, &payload) {
            Ok(Message::Sleep { duration_ms }) => {
                debug!("sleep duration set to {} ms", duration_ms);
                self.sleep_ms = duration_ms;
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!("dropping malformed SLEEP: {err}");
                false
            }
        }
    }
}
