//! Shared identity and event types for the RUM reporting SDK.
//!
//! This crate is the leaf of the workspace: identifier allocation, the
//! per-client reporting session, and the canonical event record that the
//! client crate signs and ships. It has **no internal dependencies**.
//!
//! ```text
//! IdAllocator ──┬──▶ SessionContext (sid, rid, lazily latched)
//!               └──▶ EventRecord.eid (fresh per event)
//!
//! RawEvent {ev?, attrs?} ──▶ EventRecord {ev, sid, rid, ts, eid, source, attrs}
//! ```
//!
//! # Key Types
//!
//! |--------------------|---------------------------------------------------|
//! | Type               | Purpose                                           |
//! |--------------------|---------------------------------------------------|
//! | [`IdAllocator`]    | Time-derived 64-bit ids with a per-ms sequence    |
//! | [`SessionContext`] | Session id + reporting id, set once then reused   |
//! | [`AttributeValue`] | Closed set of caller attribute values             |
//! | [`EventRecord`]    | One event in wire shape                           |
//! | [`RawEvent`]       | Caller-supplied batch entry, possibly incomplete  |
//! |--------------------|---------------------------------------------------|

pub mod event;
pub mod ids;
pub mod session;

pub use event::{AttributeValue, Attributes, EventRecord, RawEvent};
pub use ids::IdAllocator;
pub use session::SessionContext;

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Current time as Unix seconds, truncated to the 32-bit wire width.
pub fn now_secs() -> i32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i32)
        .unwrap_or(0)
}
