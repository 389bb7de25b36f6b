use thiserror::Error;

/// Errors produced while framing, deframing, or verifying payloads.
///
/// Protocol errors are logged and the offending frame dropped; a session
/// that keeps producing them is disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid magic 0x{0:08X}")]
    InvalidMagic(u32),
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("frame truncated: expected {expected} bytes, have {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("payload verification failed: {0}")]
    VerifyFailed(String),
}
