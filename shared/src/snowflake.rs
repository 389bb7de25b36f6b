use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Custom epoch for the timestamp field: 2024-01-01 00:00:00 UTC.
const DEFAULT_EPOCH_MS: u64 = 1_704_067_200_000;

const WORKER_ID_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_WORKER_ID: u16 = (1 << WORKER_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnowflakeError {
    /// Worker ids are a 10-bit namespace.
    #[error("worker id {0} out of range (0-1023)")]
    WorkerIdOutOfRange(u16),
    /// The system clock moved backwards since the last generated id.
    /// Generating through a regression would hand out duplicate ids, so
    /// this is fatal to the caller.
    #[error("clock moved backwards: last {last_ms} ms, now {now_ms} ms")]
    ClockRegression { last_ms: u64, now_ms: u64 },
}

/// Time-ordered 64-bit unique id generator.
///
/// Layout: 1 sign bit (always 0) | 41-bit milliseconds since epoch |
/// 10-bit worker id | 12-bit intra-millisecond sequence.
///
/// Ids are unique only within a single worker id; distinct processes must
/// be assigned distinct worker ids. Monotonicity is not preserved across
/// restarts (the sequence restarts and the clock is trusted).
pub struct SnowflakeIdGenerator {
    worker_id: u16,
    epoch_ms: u64,
    sequence: u64,
    last_timestamp_ms: u64,
}

impl SnowflakeIdGenerator {
    pub fn new(worker_id: u16) -> Result<Self, SnowflakeError> {
        Self::with_epoch(worker_id, DEFAULT_EPOCH_MS)
    }

    pub fn with_epoch(worker_id: u16, epoch_ms: u64) -> Result<Self, SnowflakeError> {
        if worker_id > MAX_WORKER_ID {
            return Err(SnowflakeError::WorkerIdOutOfRange(worker_id));
        }
        Ok(Self {
            worker_id,
            epoch_ms,
            sequence: 0,
            last_timestamp_ms: 0,
        })
    }

    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    /// Generates the next id. When the intra-millisecond sequence
    /// overflows, busy-waits until the next millisecond.
    pub fn next_id(&mut self) -> Result<u64, SnowflakeError> {
        let mut timestamp = self.current_timestamp_ms();

        if timestamp < self.last_timestamp_ms {
            return Err(SnowflakeError::ClockRegression {
                last_ms: self.last_timestamp_ms,
                now_ms: timestamp,
            });
        }

        if timestamp == self.last_timestamp_ms {
            self.sequence = (self.sequence + 1) & SEQUENCE_MASK;
            if self.sequence == 0 {
                while timestamp <= self.last_timestamp_ms {
                    timestamp = self.current_timestamp_ms();
                }
            }
        } else {
            self.sequence = 0;
        }

        self.last_timestamp_ms = timestamp;

        Ok(((timestamp - self.epoch_ms) << (WORKER_ID_BITS + SEQUENCE_BITS))
            | ((self.worker_id as u64) << SEQUENCE_BITS)
            | self.sequence)
    }

    fn current_timestamp_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
