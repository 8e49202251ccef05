//! SNP - Sensor Node Protocol engine for low-bandwidth mesh radio networks
//!
//! A fixed coordinator ("server") discovers battery-powered sensor nodes,
//! queries their readings and commands them into low-power sleep. This crate
//! implements the protocol state machine shared by both roles:
//!
//! - [`protocol`]: the four message kinds and their binary payload layouts
//! - [`node::SnpNode`]: announces itself, answers queries, honors sleep
//! - [`server::SnpServer`]: single-exchange primitives for the coordinator
//! - [`registry::NodeRecord`]: snapshot of a discovered node's manifest
//!
//! The mesh network itself is an external collaborator behind the
//! [`transport::MeshTransport`] trait; platform sleep and battery reading
//! sit behind [`platform`] capabilities so tests can supply synthetic
//! implementations.

pub mod config;
pub mod error;
pub mod node;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use config::SnpConfig;
pub use error::{Error, Result};
pub use node::{PollOutcome, SnpNode};
pub use protocol::{Message, MessageKind, SensorType, MAX_SENSORS, SERVER_ADDRESS};
pub use registry::{Measurement, NodeRecord};
pub use server::{Incoming, SnpServer};
pub use transport::{MeshHeader, MeshTransport};
