use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use emberfall_shared::protocol::{MsgId, Packet};
use emberfall_shared::{encode_frame, ProtocolError};

use crate::ecs::Entity;

pub type SessionId = u64;

/// Consecutive protocol errors after which a session is disconnected.
pub const PROTOCOL_ERROR_LIMIT: u32 = 8;

pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The connection state shared between the I/O threads and the logic
/// thread. The receive queue and the writer channel are the only
/// cross-thread hand-off points.
pub struct SessionShared {
    pub id: SessionId,
    pub addr: SocketAddr,
    recv: Mutex<VecDeque<Packet>>,
    send_tx: Mutex<Option<Sender<Vec<u8>>>>,
    connected: AtomicBool,
    last_heard_ms: AtomicU64,
}

impl SessionShared {
    pub fn new(id: SessionId, addr: SocketAddr, send_tx: Sender<Vec<u8>>) -> Self {
        Self {
            id,
            addr,
            recv: Mutex::new(VecDeque::new()),
            send_tx: Mutex::new(Some(send_tx)),
            connected: AtomicBool::new(true),
            last_heard_ms: AtomicU64::new(unix_time_ms()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Flips the connection to disconnected. Returns true only for the
    /// caller that performed the transition, so disconnect notification
    /// fires exactly once.
    pub fn mark_disconnected(&self) -> bool {
        let was_connected = self.connected.swap(false, Ordering::AcqRel);
        if was_connected {
            *self
                .send_tx
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        }
        was_connected
    }

    pub fn mark_heard(&self) {
        self.last_heard_ms.store(unix_time_ms(), Ordering::Release);
    }

    pub fn millis_since_heard(&self) -> u64 {
        unix_time_ms().saturating_sub(self.last_heard_ms.load(Ordering::Acquire))
    }

    /// Called from the reader thread with each complete packet, in wire
    /// order.
    pub fn push_received(&self, packet: Packet) {
        self.recv
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(packet);
    }

    /// Drains queued packets for the logic thread, preserving order.
    pub fn drain_received(&self) -> Vec<Packet> {
        self.recv
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }

    /// Hands a complete frame to the writer thread. Frames sent after
    /// disconnect are dropped silently.
    pub fn send_frame(&self, frame: Vec<u8>) -> bool {
        let guard = self
            .send_tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(sender) => sender.send(frame).is_ok(),
            None => false,
        }
    }
}

/// Logic-thread view of one connected client: sequencing state plus the
/// login/selection progress.
pub struct Session {
    pub shared: std::sync::Arc<SessionShared>,
    send_seq: u16,
    last_recv_seq: Option<u16>,
    pub protocol_errors: u32,
    pub account_id: Option<u64>,
    pub character_id: Option<u32>,
    pub entity: Option<Entity>,
}

impl Session {
    pub fn new(shared: std::sync::Arc<SessionShared>) -> Self {
        Self {
            shared,
            send_seq: 0,
            last_recv_seq: None,
            protocol_errors: 0,
            account_id: None,
            character_id: None,
            entity: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// Validates an inbound sequence number: exactly one past the last
    /// accepted value (wrapping), starting from 0. A gap or replay is a
    /// protocol error and the frame is dropped.
    pub fn accept_sequence(&mut self, sequence: u16) -> Result<(), ProtocolError> {
        let expected = match self.last_recv_seq {
            None => 0,
            Some(last) => last.wrapping_add(1),
        };
        if sequence != expected {
            return Err(ProtocolError::VerifyFailed(format!(
                "sequence gap: expected {expected}, got {sequence}"
            )));
        }
        self.last_recv_seq = Some(sequence);
        Ok(())
    }

    /// Encodes and queues one outbound message with the session's next
    /// send sequence.
    pub fn send(&mut self, msg_id: MsgId, flags: u8, payload: &[u8]) -> bool {
        let frame = match encode_frame(msg_id, self.send_seq, flags, payload) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("failed to encode frame for session {}: {err}", self.id());
                return false;
            }
        };
        self.send_seq = self.send_seq.wrapping_add(1);
        self.shared.send_frame(frame)
    }
}
