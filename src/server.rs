//! Server role engine
//!
//! Runs on the coordinator. Deliberately a stateless façade over the
//! transport: it brokers single message exchanges, while all node
//! bookkeeping (which node is active, how many queries are outstanding,
//! when to advance to SLEEP) lives in the orchestrating application. The
//! reference deployment polls one node at a time, but nothing here
//! requires that.

use crate::error::{Error, Result};
use crate::protocol::{Message, MessageKind, SensorType};
use crate::registry::{Measurement, NodeRecord};
use crate::transport::MeshTransport;
use log::{debug, trace};
use std::time::{Duration, Instant};

/// Which awaited message kind is next in the incoming queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    /// A HELLO is pending; consume it with [`SnpServer::consume_announcement`]
    Announcement,
    /// A REPLY is pending; consume it with [`SnpServer::consume_reply`]
    Reply,
}

/// The coordinator protocol engine
pub struct SnpServer<T: MeshTransport> {
    transport: T,
}

impl<T: MeshTransport> SnpServer<T> {
    /// Create a server engine over a transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Block until a HELLO or REPLY is next in the incoming queue
    ///
    /// Pumps the transport in a tight loop with no bound; run it on a
    /// dedicated control loop, or use
    /// [`wait_for_announcement_or_reply_timeout`](Self::wait_for_announcement_or_reply_timeout)
    /// when a bound is needed. Any other message kind encountered while
    /// scanning is drained and discarded.
    pub fn wait_for_announcement_or_reply(&mut self) -> Incoming {
        loop {
            self.transport.update();
            if let Some(incoming) = self.scan_pending() {
                return incoming;
            }
        }
    }

    /// Bounded variant of [`wait_for_announcement_or_reply`](Self::wait_for_announcement_or_reply)
    pub fn wait_for_announcement_or_reply_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Incoming> {
        let deadline = Instant::now() + timeout;
        loop {
            self.transport.update();
            if let Some(incoming) = self.scan_pending() {
                return Ok(incoming);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout);
            }
        }
    }

    /// Drain non-awaited frames; report whether a HELLO or REPLY is next
    fn scan_pending(&mut self) -> Option<Incoming> {
        while let Some(header) = self.transport.peek() {
            match MessageKind::from_raw(header.kind) {
                Some(MessageKind::Hello) => return Some(Incoming::Announcement),
                Some(MessageKind::Reply) => return Some(Incoming::Reply),
                _ => {
                    trace!(
                        "draining kind {:#04x} from {:#o} while waiting",
                        header.kind,
                        header.from
                    );
                    self.transport.discard();
                }
            }
            self.transport.update();
        }
        None
    }

    /// Consume the pending HELLO and materialize a node record
    ///
    /// Call only after [`Incoming::Announcement`] was indicated; a
    /// different or missing frame is an [`Error::UnexpectedMessage`].
    pub fn consume_announcement(&mut self) -> Result<NodeRecord> {
        let (header, payload) = self
            .transport
            .read()
            .ok_or(Error::UnexpectedMessage {
                expected: "HELLO",
                actual: "empty queue",
            })?;
        match Message::decode(header.kind, &payload)? {
            Message::Hello {
                battery_mv,
                sensor_count,
                sensors,
            } => {
                debug!(
                    "node {:#o} announced: {} mV, {} sensors",
                    header.from, battery_mv, sensor_count
                );
                Ok(NodeRecord {
                    address: header.from,
                    battery_mv,
                    sensor_count,
                    sensors,
                })
            }
            other => Err(Error::UnexpectedMessage {
                expected: "HELLO",
                actual: other.kind().name(),
            }),
        }
    }

    /// Consume the pending REPLY; returns the originating address and the
    /// decoded measurement
    pub fn consume_reply(&mut self) -> Result<(u16, Measurement)> {
        let (header, payload) = self
            .transport
            .read()
            .ok_or(Error::UnexpectedMessage {
                expected: "REPLY",
                actual: "empty queue",
            })?;
        match Message::decode(header.kind, &payload)? {
            Message::Reply { sensor, value } => {
                debug!("node {:#o} replied {:?} = {}", header.from, sensor, value);
                Ok((header.from, Measurement { sensor, value }))
            }
            other => Err(Error::UnexpectedMessage {
                expected: "REPLY",
                actual: other.kind().name(),
            }),
        }
    }

    /// Fire-and-forget QUERY for one sensor of one node
    ///
    /// Returns whether the transport accepted the frame; no acknowledgment
    /// is tracked at this layer.
    pub fn send_query(&mut self, node_address: u16, sensor: SensorType) -> bool {
        debug!("querying node {:#o} for {:?}", node_address, sensor);
        let msg = Message::Query { sensor };
        self.transport
            .write(node_address, MessageKind::Query as u8, &msg.encode())
    }

    /// Fire-and-forget SLEEP command
    pub fn send_sleep(&mut self, node_address: u16, duration_ms: u16) -> bool {
        debug!("sending node {:#o} to sleep for {} ms", node_address, duration_ms);
        let msg = Message::Sleep { duration_ms };
        self.transport
            .write(node_address, MessageKind::Sleep as u8, &msg.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MAX_SENSORS, SERVER_ADDRESS};
    use crate::transport::mock::{Frame, MockMesh};

    fn hello_frame(from: u16, battery_mv: u16, advertised: &[SensorType]) -> Frame {
        let mut sensors = [SensorType::NoSensor; MAX_SENSORS];
        sensors[..advertised.len()].copy_from_slice(advertised);
        Frame {
            from,
            to: SERVER_ADDRESS,
            kind: MessageKind::Hello as u8,
            payload: Message::Hello {
                battery_mv,
                sensor_count: advertised.len() as u8,
                sensors,
            }
            .encode(),
        }
    }

    fn reply_frame(from: u16, sensor: SensorType, value: f32) -> Frame {
        Frame {
            from,
            to: SERVER_ADDRESS,
            kind: MessageKind::Reply as u8,
            payload: Message::Reply { sensor, value }.encode(),
        }
    }

    #[test]
    fn test_wait_classifies_hello() {
        let mesh = MockMesh::new();
        mesh.inject(hello_frame(3, 3300, &[SensorType::Ds18b20Temp]));
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert_eq!(server.wait_for_announcement_or_reply(), Incoming::Announcement);
    }

    #[test]
    fn test_wait_classifies_reply_and_drains_noise() {
        let mesh = MockMesh::new();
        // Unknown kind and a stray QUERY ahead of the awaited REPLY
        mesh.inject(Frame {
            from: 4,
            to: SERVER_ADDRESS,
            kind: 0x42,
            payload: vec![0xFF],
        });
        mesh.inject(Frame {
            from: 4,
            to: SERVER_ADDRESS,
            kind: MessageKind::Query as u8,
            payload: Message::Query {
                sensor: SensorType::Dht22Temp,
            }
            .encode(),
        });
        mesh.inject(reply_frame(4, SensorType::Dht22Temp, 19.0));
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert_eq!(server.wait_for_announcement_or_reply(), Incoming::Reply);
        let (from, measurement) = server.consume_reply().unwrap();
        assert_eq!(from, 4);
        assert_eq!(measurement.sensor, SensorType::Dht22Temp);
        assert_eq!(measurement.value, 19.0);
    }

    #[test]
    fn test_wait_timeout_on_silent_mesh() {
        let mesh = MockMesh::new();
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        let err = server
            .wait_for_announcement_or_reply_timeout(Duration::from_millis(5))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[test]
    fn test_snapshot_fidelity() {
        let mesh = MockMesh::new();
        mesh.inject(hello_frame(3, 3300, &[SensorType::Ds18b20Temp]));
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        server.wait_for_announcement_or_reply();
        let record = server.consume_announcement().unwrap();

        assert_eq!(record.address, 3);
        assert_eq!(record.battery_mv, 3300);
        assert_eq!(record.sensor_count, 1);
        assert_eq!(record.sensors[0], SensorType::Ds18b20Temp);
        assert_eq!(
            record.advertised().collect::<Vec<_>>(),
            vec![SensorType::Ds18b20Temp]
        );
    }

    #[test]
    fn test_consume_announcement_on_wrong_kind() {
        let mesh = MockMesh::new();
        mesh.inject(reply_frame(2, SensorType::Mcp9700Temp, 1.0));
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));
        server.wait_for_announcement_or_reply();

        let err = server.consume_announcement().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedMessage {
                expected: "HELLO",
                actual: "REPLY",
            }
        ));
    }

    #[test]
    fn test_consume_on_empty_queue() {
        let mesh = MockMesh::new();
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert!(server.consume_reply().is_err());
        assert!(server.consume_announcement().is_err());
    }

    #[test]
    fn test_send_query_wire_content() {
        let mesh = MockMesh::new();
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert!(server.send_query(3, SensorType::Dht22Hum));

        let sent = mesh.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, SERVER_ADDRESS);
        assert_eq!(sent[0].to, 3);
        assert_eq!(sent[0].kind, MessageKind::Query as u8);
        assert_eq!(
            Message::decode(sent[0].kind, &sent[0].payload).unwrap(),
            Message::Query {
                sensor: SensorType::Dht22Hum
            }
        );
    }

    #[test]
    fn test_send_sleep_wire_content() {
        let mesh = MockMesh::new();
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert!(server.send_sleep(3, 60000));

        let sent = mesh.sent();
        assert_eq!(
            Message::decode(sent[0].kind, &sent[0].payload).unwrap(),
            Message::Sleep { duration_ms: 60000 }
        );
    }

    #[test]
    fn test_send_reports_transport_rejection() {
        let mesh = MockMesh::new();
        mesh.set_fail_writes(true);
        let mut server = SnpServer::new(mesh.endpoint(SERVER_ADDRESS));

        assert!(!server.send_query(3, SensorType::Mcp9700Temp));
        assert!(!server.send_sleep(3, 1000));
    }
}
