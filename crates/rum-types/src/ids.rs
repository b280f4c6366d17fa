//! Time-derived event and session identifiers.
//!
//! An id is `unix_millis * 1000 + seq`, where `seq` cycles through `0..=999`.
//! Ids trend upward with wall-clock time and are practically unique under
//! normal load. They are not unique across process restarts, or when more
//! than 1000 ids are drawn inside one millisecond.
//!
//! Each client owns its own allocator; there is no process-wide counter.

use parking_lot::Mutex;

/// Width of the sequence suffix: ids end in three decimal digits.
pub const SEQUENCE_SPAN: i64 = 1000;

/// Largest sequence value before it wraps back to zero.
const SEQUENCE_MAX: u16 = 999;

/// Allocator for 64-bit ids. Safe to share across threads.
#[derive(Debug, Default)]
pub struct IdAllocator {
    sequence: Mutex<u16>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next id. Never fails.
    pub fn next_id(&self) -> i64 {
        // Clock read is outside the lock; only the counter is serialized.
        let millis = crate::now_millis();
        let seq = self.bump();
        millis * SEQUENCE_SPAN + i64::from(seq)
    }

    fn bump(&self) -> u16 {
        let mut seq = self.sequence.lock();
        *seq = if *seq >= SEQUENCE_MAX { 0 } else { *seq + 1 };
        *seq
    }
}

// ============================================================================
// Tests
// ============================================================================
