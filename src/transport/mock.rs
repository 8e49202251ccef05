//! Mock mesh transport for testing

use super::{MeshHeader, MeshTransport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One frame traveling through the mock mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Originating address
    pub from: u16,
    /// Destination address
    pub to: u16,
    /// Raw message type tag
    pub kind: u8,
    /// Payload bytes
    pub payload: Vec<u8>,
}

struct MeshInner {
    /// Frames written but not yet delivered; `update()` on the destination
    /// endpoint moves them into its inbox
    in_flight: Vec<Frame>,
    inboxes: HashMap<u16, VecDeque<Frame>>,
    sent_log: Vec<Frame>,
    fail_writes: bool,
}

/// In-memory mesh connecting any number of endpoints by address
///
/// Delivery mirrors the real transport's pump contract: a written frame
/// stays in flight until the destination endpoint calls `update()`.
#[derive(Clone)]
pub struct MockMesh {
    inner: Arc<Mutex<MeshInner>>,
}

impl MockMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        MockMesh {
            inner: Arc::new(Mutex::new(MeshInner {
                in_flight: Vec::new(),
                inboxes: HashMap::new(),
                sent_log: Vec::new(),
                fail_writes: false,
            })),
        }
    }

    /// Create an endpoint bound to a transport address
    pub fn endpoint(&self, address: u16) -> MockEndpoint {
        MockEndpoint {
            inner: Arc::clone(&self.inner),
            address,
        }
    }

    /// Inject a frame directly into flight (e.g. foreign or malformed traffic)
    pub fn inject(&self, frame: Frame) {
        let mut inner = self.inner.lock().unwrap();
        inner.in_flight.push(frame);
    }

    /// Make all subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_writes = fail;
    }

    /// All frames ever accepted by `write`, in order
    pub fn sent(&self) -> Vec<Frame> {
        let inner = self.inner.lock().unwrap();
        inner.sent_log.clone()
    }

    /// Clear the sent-frame log
    pub fn clear_sent(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.sent_log.clear();
    }
}

impl Default for MockMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// One endpoint of a [`MockMesh`], implementing [`MeshTransport`]
pub struct MockEndpoint {
    inner: Arc<Mutex<MeshInner>>,
    address: u16,
}

impl MockEndpoint {
    /// Address this endpoint is bound to
    pub fn address(&self) -> u16 {
        self.address
    }
}

impl MeshTransport for MockEndpoint {
    fn update(&mut self) {
        let mut inner = self.inner.lock().unwrap();
        let address = self.address;
        let mut kept = Vec::new();
        let mut delivered = Vec::new();
        for frame in inner.in_flight.drain(..) {
            if frame.to == address {
                delivered.push(frame);
            } else {
                kept.push(frame);
            }
        }
        inner.in_flight = kept;
        inner
            .inboxes
            .entry(address)
            .or_default()
            .extend(delivered);
    }

    fn available(&mut self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .inboxes
            .get(&self.address)
            .is_some_and(|q| !q.is_empty())
    }

    fn peek(&mut self) -> Option<MeshHeader> {
        let inner = self.inner.lock().unwrap();
        inner
            .inboxes
            .get(&self.address)
            .and_then(|q| q.front())
            .map(|frame| MeshHeader {
                from: frame.from,
                to: frame.to,
                kind: frame.kind,
            })
    }

    fn read(&mut self) -> Option<(MeshHeader, Vec<u8>)> {
        let mut inner = self.inner.lock().unwrap();
        let frame = inner.inboxes.get_mut(&self.address)?.pop_front()?;
        let header = MeshHeader {
            from: frame.from,
            to: frame.to,
            kind: frame.kind,
        };
        Some((header, frame.payload))
    }

    fn write(&mut self, to: u16, kind: u8, payload: &[u8]) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return false;
        }
        let frame = Frame {
            from: self.address,
            to,
            kind,
            payload: payload.to_vec(),
        };
        inner.sent_log.push(frame.clone());
        inner.in_flight.push(frame);
        true
    }
}
