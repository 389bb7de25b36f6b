use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use emberfall_shared::protocol::messages::login::{HeartbeatReq, HeartbeatRsp};
use emberfall_shared::protocol::{msg_id, MsgId, Packet};
use emberfall_shared::transport::TransportError;
use emberfall_shared::{
    encode_frame, encode_payload, FrameDecoder, HEARTBEAT_INTERVAL, HEARTBEAT_TIMEOUT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Transport tuning. The defaults match the production protocol
/// constants; tests shrink them.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub auto_reconnect: bool,
    pub reconnect_backoff_initial: Duration,
    pub reconnect_backoff_max: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL,
            heartbeat_timeout: HEARTBEAT_TIMEOUT,
            auto_reconnect: false,
            reconnect_backoff_initial: Duration::from_secs(1),
            reconnect_backoff_max: Duration::from_secs(30),
        }
    }
}

/// The client's session transport. Implementations own one connection;
/// `update()` is called from the main thread and is where received
/// packets and connection events become visible.
pub trait NetworkClient {
    fn connect(&mut self, host: &str, port: u16) -> bool;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn state(&self) -> ConnectionState;
    fn last_error(&self) -> Option<TransportError>;

    /// Queues one message. Sends while disconnected are dropped
    /// silently.
    fn send(&mut self, msg_id: MsgId, flags: u8, payload: &[u8]);

    /// Pumps heartbeats, timeouts, and reconnection. Call once per
    /// frame before draining packets.
    fn update(&mut self);

    /// Takes the next received packet, in exact wire order.
    fn poll_packet(&mut self) -> Option<Packet>;

    /// True once per successful connect.
    fn take_connect_event(&mut self) -> bool;

    /// The error behind a disconnect, once per disconnect.
    fn take_disconnect_event(&mut self) -> Option<TransportError>;

    /// Smoothed round-trip estimate from heartbeat responses.
    fn rtt_ms(&self) -> Option<u32>;
}

fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct SharedState {
    recv: Mutex<VecDeque<Packet>>,
    connected: AtomicBool,
    disconnect_error: Mutex<Option<TransportError>>,
    last_recv_ms: AtomicU64,
}

impl SharedState {
    fn new() -> Self {
        Self {
            recv: Mutex::new(VecDeque::new()),
            connected: AtomicBool::new(true),
            disconnect_error: Mutex::new(None),
            last_recv_ms: AtomicU64::new(unix_time_ms()),
        }
    }

    fn fail(&self, error: TransportError) {
        if self.connected.swap(false, Ordering::AcqRel) {
            let mut slot = self
                .disconnect_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Some(error);
        }
    }
}

/// TCP implementation: a background reader thread fills the receive
/// queue; a writer thread drains the send channel so exactly one write
/// is in flight; heartbeats, RTT, timeout detection, and bounded-backoff
/// reconnection run in `update()` on the caller's thread.
pub struct TcpNetworkClient {
    config: TransportConfig,
    state: ConnectionState,
    shared: Option<Arc<SharedState>>,
    send_tx: Option<Sender<Vec<u8>>>,
    remote: Option<(String, u16)>,
    send_seq: u16,
    last_recv_seq: Option<u16>,
    last_error: Option<TransportError>,
    pending_connect_event: bool,
    pending_disconnect_event: Option<TransportError>,
    heartbeat_seq: u32,
    last_heartbeat_at: Option<Instant>,
    rtt_ms: Option<u32>,
    next_reconnect_at: Option<Instant>,
    reconnect_backoff: Duration,
}

impl TcpNetworkClient {
    pub fn new(config: TransportConfig) -> Self {
        let reconnect_backoff = config.reconnect_backoff_initial;
        Self {
            config,
            state: ConnectionState::Disconnected,
            shared: None,
            send_tx: None,
            remote: None,
            send_seq: 0,
            last_recv_seq: None,
            last_error: None,
            pending_connect_event: false,
            pending_disconnect_event: None,
            heartbeat_seq: 0,
            last_heartbeat_at: None,
            rtt_ms: None,
            next_reconnect_at: None,
            reconnect_backoff,
        }
    }

    fn open_connection(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let stream = TcpStream::connect((host, port))
            .map_err(|err| TransportError::ConnectFailed(err.to_string()))?;
        let _ = stream.set_nodelay(true);
        // Reads poll so the reader thread can notice local disconnects.
        let _ = stream.set_read_timeout(Some(Duration::from_millis(250)));

        let shared = Arc::new(SharedState::new());
        let (send_tx, send_rx) = mpsc::channel::<Vec<u8>>();

        spawn_reader(
            stream
                .try_clone()
                .map_err(|err| TransportError::ConnectFailed(err.to_string()))?,
            Arc::clone(&shared),
        );
        spawn_writer(stream, send_rx, Arc::clone(&shared));

        self.shared = Some(shared);
        self.send_tx = Some(send_tx);
        self.send_seq = 0;
        self.last_recv_seq = None;
        self.state = ConnectionState::Connected;
        self.pending_connect_event = true;
        self.last_heartbeat_at = None;
        self.reconnect_backoff = self.config.reconnect_backoff_initial;
        self.next_reconnect_at = None;
        info!("connected to {host}:{port}");
        Ok(())
    }

    fn handle_connection_down(&mut self, error: TransportError) {
        warn!("disconnected: {error}");
        self.shared = None;
        self.send_tx = None;
        self.last_error = Some(error.clone());
        self.pending_disconnect_event = Some(error);
        self.rtt_ms = None;

        if self.config.auto_reconnect && self.remote.is_some() {
            self.state = ConnectionState::Reconnecting;
            self.next_reconnect_at = Some(Instant::now() + self.reconnect_backoff);
            self.reconnect_backoff =
                (self.reconnect_backoff * 2).min(self.config.reconnect_backoff_max);
        } else {
            self.state = ConnectionState::Disconnected;
        }
    }

    fn send_heartbeat(&mut self) {
        self.heartbeat_seq += 1;
        let req = HeartbeatReq {
            heartbeat_seq: self.heartbeat_seq,
            client_time_ms: unix_time_ms(),
        };
        if let Ok(payload) = encode_payload(&req) {
            self.send(msg_id::HEARTBEAT_REQ, 0, &payload);
        }
        self.last_heartbeat_at = Some(Instant::now());
    }

    /// Verifies server-side sequence continuity; a gap is a protocol
    /// violation on an ordered transport.
    fn accept_sequence(&mut self, sequence: u16) -> bool {
        let expected = match self.last_recv_seq {
            None => 0,
            Some(last) => last.wrapping_add(1),
        };
        if sequence != expected {
            warn!("sequence gap from server: expected {expected}, got {sequence}");
            return false;
        }
        self.last_recv_seq = Some(sequence);
        true
    }
}

impl NetworkClient for TcpNetworkClient {
    fn connect(&mut self, host: &str, port: u16) -> bool {
        if matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Connecting
        ) {
            return true;
        }
        self.remote = Some((host.to_string(), port));
        self.state = ConnectionState::Connecting;
        match self.open_connection(host, port) {
            Ok(()) => true,
            Err(error) => {
                self.handle_connection_down(error);
                false
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(shared) = &self.shared {
            shared.fail(TransportError::Closed);
        }
        self.shared = None;
        self.send_tx = None;
        self.state = ConnectionState::Disconnected;
        self.next_reconnect_at = None;
    }

    fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
            && self
                .shared
                .as_ref()
                .is_some_and(|shared| shared.connected.load(Ordering::Acquire))
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn last_error(&self) -> Option<TransportError> {
        self.last_error.clone()
    }

    fn send(&mut self, msg_id: MsgId, flags: u8, payload: &[u8]) {
        if !self.is_connected() {
            debug!("dropping send of 0x{msg_id:04X} while disconnected");
            return;
        }
        let frame = match encode_frame(msg_id, self.send_seq, flags, payload) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("failed to encode 0x{msg_id:04X}: {err}");
                return;
            }
        };
        self.send_seq = self.send_seq.wrapping_add(1);
        if let Some(sender) = &self.send_tx {
            let _ = sender.send(frame);
        }
    }

    fn update(&mut self) {
        // Surface an asynchronous connection failure exactly once.
        let failed = self.shared.as_ref().and_then(|shared| {
            if shared.connected.load(Ordering::Acquire) {
                None
            } else {
                shared
                    .disconnect_error
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .take()
                    .or(Some(TransportError::Closed))
            }
        });
        if let Some(error) = failed {
            self.handle_connection_down(error);
        }

        match self.state {
            ConnectionState::Connected => {
                let silent_ms = self
                    .shared
                    .as_ref()
                    .map(|shared| {
                        unix_time_ms().saturating_sub(shared.last_recv_ms.load(Ordering::Acquire))
                    })
                    .unwrap_or(0);
                if silent_ms > self.config.heartbeat_timeout.as_millis() as u64 {
                    if let Some(shared) = &self.shared {
                        shared.fail(TransportError::HeartbeatTimeout);
                    }
                    self.handle_connection_down(TransportError::HeartbeatTimeout);
                    return;
                }

                let due = self
                    .last_heartbeat_at
                    .is_none_or(|at| at.elapsed() >= self.config.heartbeat_interval);
                if due {
                    self.send_heartbeat();
                }
            }
            ConnectionState::Reconnecting => {
                let due = self.next_reconnect_at.is_some_and(|at| Instant::now() >= at);
                if due {
                    if let Some((host, port)) = self.remote.clone() {
                        debug!("reconnecting to {host}:{port}");
                        if self.open_connection(&host, port).is_err() {
                            self.next_reconnect_at = Some(Instant::now() + self.reconnect_backoff);
                            self.reconnect_backoff =
                                (self.reconnect_backoff * 2).min(self.config.reconnect_backoff_max);
                        }
                    }
                }
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {}
        }
    }

    fn poll_packet(&mut self) -> Option<Packet> {
        loop {
            let packet = {
                let shared = self.shared.as_ref()?;
                let mut recv = shared
                    .recv
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                recv.pop_front()?
            };

            if !self.accept_sequence(packet.sequence()) {
                continue;
            }

            // Heartbeat responses update RTT and are still delivered so
            // interested handlers can observe them.
            if packet.msg_id() == msg_id::HEARTBEAT_RSP {
                if let Ok(rsp) = packet.decode::<HeartbeatRsp>() {
                    let now = unix_time_ms();
                    if now >= rsp.client_time_ms {
                        self.rtt_ms = Some((now - rsp.client_time_ms) as u32);
                    }
                }
            }
            return Some(packet);
        }
    }

    fn take_connect_event(&mut self) -> bool {
        std::mem::take(&mut self.pending_connect_event)
    }

    fn take_disconnect_event(&mut self) -> Option<TransportError> {
        self.pending_disconnect_event.take()
    }

    fn rtt_ms(&self) -> Option<u32> {
        self.rtt_ms
    }
}

impl Default for TcpNetworkClient {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

fn spawn_reader(mut stream: TcpStream, shared: Arc<SharedState>) {
    thread::Builder::new()
        .name("net-read".into())
        .spawn(move || {
            let mut decoder = FrameDecoder::new();
            let mut buffer = [0u8; 4096];
            loop {
                if !shared.connected.load(Ordering::Acquire) {
                    return;
                }
                let read = match stream.read(&mut buffer) {
                    Ok(0) => {
                        shared.fail(TransportError::Closed);
                        return;
                    }
                    Ok(read) => read,
                    Err(err)
                        if err.kind() == std::io::ErrorKind::WouldBlock
                            || err.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(err) => {
                        shared.fail(TransportError::ReadError(err.to_string()));
                        return;
                    }
                };

                shared.last_recv_ms.store(unix_time_ms(), Ordering::Release);
                decoder.feed(&buffer[..read]);
                loop {
                    match decoder.next_packet() {
                        Ok(Some(packet)) => {
                            shared
                                .recv
                                .lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner())
                                .push_back(packet);
                        }
                        Ok(None) => break,
                        Err(err) => {
                            shared.fail(TransportError::ReadError(err.to_string()));
                            return;
                        }
                    }
                }
            }
        })
        .expect("spawn reader thread");
}

fn spawn_writer(mut stream: TcpStream, send_rx: mpsc::Receiver<Vec<u8>>, shared: Arc<SharedState>) {
    thread::Builder::new()
        .name("net-write".into())
        .spawn(move || {
            while let Ok(frame) = send_rx.recv() {
                if let Err(err) = stream.write_all(&frame) {
                    shared.fail(TransportError::WriteError(err.to_string()));
                    return;
                }
            }
            let _ = stream.shutdown(std::net::Shutdown::Both);
        })
        .expect("spawn writer thread");
}
