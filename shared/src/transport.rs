use thiserror::Error;

/// Transport-level failures. Exactly one `on_disconnect` is delivered per
/// connection regardless of how many of these occur; domain errors never
/// take this path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("read error: {0}")]
    ReadError(String),
    #[error("write error: {0}")]
    WriteError(String),
    #[error("no traffic within the heartbeat timeout")]
    HeartbeatTimeout,
    #[error("connection closed by peer")]
    Closed,
}
