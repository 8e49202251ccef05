//! SNP message catalog
//!
//! The protocol has exactly four message kinds. The kind travels as the
//! transport header's type tag; only the payload bytes below go through
//! [`Message::encode`] / [`Message::decode`].
//!
//! Payload layouts (little-endian):
//!
//! ```text
//! HELLO  [battery_mv:u16] [sensor_count:u8] [sensors:u8 x MAX_SENSORS]   8 bytes
//! SLEEP  [duration_ms:u16]                                               2 bytes
//! QUERY  [sensor:u8] [value:f32, zeroed placeholder]                     5 bytes
//! REPLY  [sensor:u8] [value:f32]                                         5 bytes
//! ```
//!
//! A HELLO always carries all `MAX_SENSORS` slots; slots beyond
//! `sensor_count` are padding and are not validated on decode. The QUERY
//! value field is reserved on the wire and ignored.

use crate::error::{Error, Result};

/// Maximum number of sensors a node can register and advertise
pub const MAX_SENSORS: usize = 5;

/// Maximum number of child nodes in the fixed address pool
pub const MAX_CHILD_NODES: usize = 5;

/// Reserved transport address of the coordinator
pub const SERVER_ADDRESS: u16 = 0;

/// Pre-provisioned level-1 node addresses
pub const NODE_ADDRESSES: [u16; MAX_CHILD_NODES] = [1, 2, 3, 4, 5];

/// HELLO payload size: battery (2) + count (1) + sensor slots
pub const HELLO_WIRE_SIZE: usize = 3 + MAX_SENSORS;
/// SLEEP payload size: duration (2)
pub const SLEEP_WIRE_SIZE: usize = 2;
/// QUERY payload size: sensor (1) + reserved value (4)
pub const QUERY_WIRE_SIZE: usize = 5;
/// REPLY payload size: sensor (1) + value (4)
pub const REPLY_WIRE_SIZE: usize = 5;

/// Message type tags understood by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// Node self-announcement
    Hello = 0,
    /// Server-to-node idle command
    Sleep = 1,
    /// Server-to-node request for one reading
    Query = 2,
    /// Node-to-server measurement
    Reply = 3,
}

impl MessageKind {
    /// Parse a raw type tag, `None` for anything outside the four kinds
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(MessageKind::Hello),
            1 => Some(MessageKind::Sleep),
            2 => Some(MessageKind::Query),
            3 => Some(MessageKind::Reply),
            _ => None,
        }
    }

    /// Kind name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Sleep => "SLEEP",
            MessageKind::Query => "QUERY",
            MessageKind::Reply => "REPLY",
        }
    }
}

/// Supported sensor kinds, an opaque byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SensorType {
    /// Empty slot sentinel
    #[default]
    NoSensor = 0,
    /// MCP9700 analog temperature
    Mcp9700Temp = 1,
    /// DS18B20 1-wire temperature
    Ds18b20Temp = 2,
    /// DHT22 temperature
    Dht22Temp = 3,
    /// DHT22 humidity
    Dht22Hum = 4,
}

impl SensorType {
    /// Parse a raw sensor byte, `None` outside the closed set
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(SensorType::NoSensor),
            1 => Some(SensorType::Mcp9700Temp),
            2 => Some(SensorType::Ds18b20Temp),
            3 => Some(SensorType::Dht22Temp),
            4 => Some(SensorType::Dht22Hum),
            _ => None,
        }
    }
}

/// One SNP message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Node self-announcement: battery level plus sensor manifest
    Hello {
        /// Supply voltage in millivolts, 0 when the node has no voltage source
        battery_mv: u16,
        /// Number of populated sensor slots
        sensor_count: u8,
        /// Sensor slots in registration order, padded with `NoSensor`
        sensors: [SensorType; MAX_SENSORS],
    },
    /// Commands the receiver to idle for a duration
    Sleep {
        /// Idle duration in milliseconds
        duration_ms: u16,
    },
    /// Requests one reading; the wire carries a zeroed value placeholder
    Query {
        /// Sensor to read
        sensor: SensorType,
    },
    /// Carries a measurement back to the server
    Reply {
        /// Sensor that was read
        sensor: SensorType,
        /// Measured value
        value: f32,
    },
}

impl Message {
    /// Type tag for the transport header
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Hello { .. } => MessageKind::Hello,
            Message::Sleep { .. } => MessageKind::Sleep,
            Message::Query { .. } => MessageKind::Query,
            Message::Reply { .. } => MessageKind::Reply,
        }
    }

    /// Serialize the payload bytes (kind excluded, it rides in the header)
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Hello {
                battery_mv,
                sensor_count,
                sensors,
            } => {
                let mut buf = Vec::with_capacity(HELLO_WIRE_SIZE);
                buf.extend_from_slice(&battery_mv.to_le_bytes());
                buf.push(*sensor_count);
                for sensor in sensors {
                    buf.push(*sensor as u8);
                }
                buf
            }
            Message::Sleep { duration_ms } => duration_ms.to_le_bytes().to_vec(),
            Message::Query { sensor } => {
                let mut buf = Vec::with_capacity(QUERY_WIRE_SIZE);
                buf.push(*sensor as u8);
                buf.extend_from_slice(&0.0f32.to_le_bytes());
                buf
            }
            Message::Reply { sensor, value } => {
                let mut buf = Vec::with_capacity(REPLY_WIRE_SIZE);
                buf.push(*sensor as u8);
                buf.extend_from_slice(&value.to_le_bytes());
                buf
            }
        }
    }

    /// Deserialize a payload against a raw type tag
    ///
    /// Unknown tags, unknown sensor bytes and wrong payload sizes are
    /// errors; trailing HELLO slots beyond `sensor_count` are padding and
    /// decode as `NoSensor` whatever their byte value.
    pub fn decode(kind_raw: u8, payload: &[u8]) -> Result<Message> {
        let kind = MessageKind::from_raw(kind_raw).ok_or(Error::UnknownMessageType(kind_raw))?;
        check_len(kind, payload)?;

        match kind {
            MessageKind::Hello => {
                let battery_mv = u16::from_le_bytes([payload[0], payload[1]]);
                let sensor_count = payload[2];
                if sensor_count as usize > MAX_SENSORS {
                    return Err(Error::SensorCountOutOfRange {
                        count: sensor_count,
                        max: MAX_SENSORS,
                    });
                }
                let mut sensors = [SensorType::NoSensor; MAX_SENSORS];
                for (i, slot) in sensors.iter_mut().enumerate().take(sensor_count as usize) {
                    let raw = payload[3 + i];
                    *slot = SensorType::from_raw(raw).ok_or(Error::UnknownSensorType(raw))?;
                }
                Ok(Message::Hello {
                    battery_mv,
                    sensor_count,
                    sensors,
                })
            }
            MessageKind::Sleep => Ok(Message::Sleep {
                duration_ms: u16::from_le_bytes([payload[0], payload[1]]),
            }),
            MessageKind::Query => {
                let sensor =
                    SensorType::from_raw(payload[0]).ok_or(Error::UnknownSensorType(payload[0]))?;
                // bytes 1..5 are the reserved value field, ignored
                Ok(Message::Query { sensor })
            }
            MessageKind::Reply => {
                let sensor =
                    SensorType::from_raw(payload[0]).ok_or(Error::UnknownSensorType(payload[0]))?;
                let value =
                    f32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
                Ok(Message::Reply { sensor, value })
            }
        }
    }
}

fn check_len(kind: MessageKind, payload: &[u8]) -> Result<()> {
    let expected = match kind {
        MessageKind::Hello => HELLO_WIRE_SIZE,
        MessageKind::Sleep => SLEEP_WIRE_SIZE,
        MessageKind::Query => QUERY_WIRE_SIZE,
        MessageKind::Reply => REPLY_WIRE_SIZE,
    };
    if payload.len() != expected {
        return Err(Error::PayloadLength {
            kind: kind.name(),
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}
