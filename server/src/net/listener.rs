use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info, warn};

use emberfall_shared::transport::TransportError;
use emberfall_shared::FrameDecoder;

use crate::net::session::{SessionId, SessionShared, PROTOCOL_ERROR_LIMIT};

/// Connection lifecycle notifications surfaced to the logic thread.
pub enum SessionEvent {
    Connected(Arc<SessionShared>),
    Disconnected(SessionId, TransportError),
}

/// Accepts TCP connections and runs one reader and one writer thread per
/// session. All decoded packets land in the session's receive queue in
/// wire order; the logic thread polls [`SessionServer::poll_events`] and
/// drains the queues each tick.
pub struct SessionServer {
    local_addr: SocketAddr,
    events: Arc<Mutex<VecDeque<SessionEvent>>>,
}

impl SessionServer {
    pub fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        info!("listening on {local_addr}");

        let events: Arc<Mutex<VecDeque<SessionEvent>>> = Arc::new(Mutex::new(VecDeque::new()));
        let next_id = Arc::new(AtomicU64::new(1));

        {
            let events = Arc::clone(&events);
            thread::Builder::new()
                .name("accept".into())
                .spawn(move || accept_loop(listener, events, next_id))
                .expect("spawn accept thread");
        }

        Ok(Self { local_addr, events })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Takes all pending connection events, in arrival order.
    pub fn poll_events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect()
    }
}

fn accept_loop(
    listener: TcpListener,
    events: Arc<Mutex<VecDeque<SessionEvent>>>,
    next_id: Arc<AtomicU64>,
) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!("accept failed: {err}");
                continue;
            }
        };
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(err) => {
                warn!("peer_addr failed: {err}");
                continue;
            }
        };
        if stream.set_nodelay(true).is_err() {
            debug!("set_nodelay failed for {peer}");
        }

        let id = next_id.fetch_add(1, Ordering::Relaxed);
        let (send_tx, send_rx) = mpsc::channel::<Vec<u8>>();
        let shared = Arc::new(SessionShared::new(id, peer, send_tx));

        spawn_reader(id, stream.try_clone(), Arc::clone(&shared), Arc::clone(&events));
        spawn_writer(id, stream, send_rx, Arc::clone(&shared), Arc::clone(&events));

        info!("session {id} connected from {peer}");
        push_event(&events, SessionEvent::Connected(shared));
    }
}

fn push_event(events: &Arc<Mutex<VecDeque<SessionEvent>>>, event: SessionEvent) {
    events
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push_back(event);
}

fn disconnect(
    shared: &Arc<SessionShared>,
    events: &Arc<Mutex<VecDeque<SessionEvent>>>,
    error: TransportError,
) {
    if shared.mark_disconnected() {
        push_event(events, SessionEvent::Disconnected(shared.id, error));
    }
}

fn spawn_reader(
    id: SessionId,
    stream: std::io::Result<TcpStream>,
    shared: Arc<SessionShared>,
    events: Arc<Mutex<VecDeque<SessionEvent>>>,
) {
    let Ok(mut stream) = stream else {
        disconnect(&shared, &events, TransportError::ReadError("clone failed".into()));
        return;
    };

    thread::Builder::new()
        .name(format!("session-{id}-read"))
        .spawn(move || {
            let mut decoder = FrameDecoder::new();
            let mut buffer = [0u8; 4096];
            let mut protocol_errors = 0u32;

            loop {
                let read = match stream.read(&mut buffer) {
                    Ok(0) => {
                        disconnect(&shared, &events, TransportError::Closed);
                        return;
                    }
                    Ok(read) => read,
                    Err(err) => {
                        disconnect(&shared, &events, TransportError::ReadError(err.to_string()));
                        return;
                    }
                };

                shared.mark_heard();
                decoder.feed(&buffer[..read]);
                loop {
                    match decoder.next_packet() {
                        Ok(Some(packet)) => shared.push_received(packet),
                        Ok(None) => break,
                        Err(err) => {
                            // Drop the frame; repeated garbage escalates
                            // to a disconnect.
                            warn!("session {id}: protocol error: {err}");
                            protocol_errors += 1;
                            if protocol_errors >= PROTOCOL_ERROR_LIMIT {
                                disconnect(
                                    &shared,
                                    &events,
                                    TransportError::ReadError(err.to_string()),
                                );
                                return;
                            }
                        }
                    }
                }

                if !shared.is_connected() {
                    return;
                }
            }
        })
        .expect("spawn reader thread");
}

fn spawn_writer(
    id: SessionId,
    mut stream: TcpStream,
    send_rx: mpsc::Receiver<Vec<u8>>,
    shared: Arc<SessionShared>,
    events: Arc<Mutex<VecDeque<SessionEvent>>>,
) {
    thread::Builder::new()
        .name(format!("session-{id}-write"))
        .spawn(move || {
            // One frame in flight at a time; the channel is the queue.
            while let Ok(frame) = send_rx.recv() {
                if let Err(err) = stream.write_all(&frame) {
                    disconnect(&shared, &events, TransportError::WriteError(err.to_string()));
                    return;
                }
            }
            let _ = stream.shutdown(std::net::Shutdown::Both);
        })
        .expect("spawn writer thread");
}
