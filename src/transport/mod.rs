//! Mesh transport abstraction
//!
//! The radio mesh (addressing, routing, delivery) is an external
//! collaborator. The role engines only require the small surface below:
//! a cooperative pump, peek/read access to the next queued frame, and a
//! fire-and-forget write.

pub mod mock;
pub use mock::MockMesh;

/// Routing header of one queued frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    /// Originating transport address
    pub from: u16,
    /// Destination transport address
    pub to: u16,
    /// Raw message type tag (may be outside the known SNP kinds)
    pub kind: u8,
}

/// Transport trait for mesh communication
///
/// All operations are synchronous and non-reentrant; the engines never
/// issue concurrent operations against one transport.
pub trait MeshTransport: Send {
    /// Advance internal delivery state (non-blocking pump)
    fn update(&mut self);

    /// Check whether a frame is queued for reading
    fn available(&mut self) -> bool;

    /// Inspect the next queued frame's header without consuming it
    fn peek(&mut self) -> Option<MeshHeader>;

    /// Consume the next queued frame
    fn read(&mut self) -> Option<(MeshHeader, Vec<u8>)>;

    /// Consume the next queued frame and drop it unread
    fn discard(&mut self) {
        let _ = self.read();
    }

    /// Enqueue an outgoing frame; `true` when the transport accepted it
    ///
    /// Acceptance is not delivery: the mesh link is best-effort and no
    /// acknowledgment reaches this layer.
    fn write(&mut self, to: u16, kind: u8, payload: &[u8]) -> bool;
}
