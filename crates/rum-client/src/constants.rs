//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// SDK version reported in logs.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `source` tag stamped onto every event.
pub const DEFAULT_SOURCE_TAG: &str = "rust";

/// Collector method that accepts a signed batch of events.
pub const ADDS_METHOD: &str = "adds";

/// Default time allowed for establishing a transport connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time a request may wait for its reply.
pub const DEFAULT_QUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ── Completion codes ────────────────────────────────────────────────────────
//
// Numeric codes handed to completion handlers. Transport codes follow the
// RPC framework's core error range.

/// Success.
pub const OK_CODE: i64 = 0;

/// Caller input rejected before anything was sent.
pub const INVALID_ARGUMENT_CODE: i64 = 10003;

/// Unclassified transport failure.
pub const UNKNOWN_ERROR_CODE: i64 = 20001;

/// Connection closed while the request was in flight.
pub const CONNECTION_CLOSED_CODE: i64 = 20002;

/// No reply within the allowed time.
pub const TIMEOUT_CODE: i64 = 20003;

/// Request could not be encoded.
pub const ENCODING_CODE: i64 = 20005;

/// Reply could not be decoded.
pub const DECODING_CODE: i64 = 20006;

/// No usable connection to the collector.
pub const INVALID_CONNECTION_CODE: i64 = 20012;
