//! Error types for the SNP engine

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SNP error types
///
/// Nothing here is fatal at the protocol layer: every failure degrades to
/// "try again later" on an unreliable best-effort radio link. Foreign
/// senders and unknown message types are not errors at all; they are
/// drained silently by the role engines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sensor registration beyond capacity; the sensor list is unchanged
    #[error("sensor capacity exceeded (max {max})")]
    SensorCapacity {
        /// Maximum number of registered sensors
        max: usize,
    },

    /// Message type tag outside the four known kinds
    #[error("unknown message type {0:#04x}")]
    UnknownMessageType(u8),

    /// Sensor type byte outside the closed enumeration
    #[error("unknown sensor type {0:#04x}")]
    UnknownSensorType(u8),

    /// Payload length does not match the fixed wire layout
    #[error("{kind} payload length mismatch: expected {expected} bytes, got {actual}")]
    PayloadLength {
        /// Message kind name
        kind: &'static str,
        /// Expected payload size
        expected: usize,
        /// Actual payload size
        actual: usize,
    },

    /// Advertised sensor count exceeds the protocol maximum
    #[error("advertised sensor count {count} exceeds maximum {max}")]
    SensorCountOutOfRange {
        /// Count carried by the HELLO payload
        count: u8,
        /// Maximum number of sensor slots
        max: usize,
    },

    /// A consume call found a different message kind than announced
    #[error("expected {expected} message, got {actual}")]
    UnexpectedMessage {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind actually pending
        actual: &'static str,
    },

    /// Bounded wait elapsed without the awaited message
    #[error("timed out waiting for incoming message")]
    Timeout,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration serialization error
    #[error("configuration write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}
