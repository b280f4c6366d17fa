//! The RPC channel the client reports through.
//!
//! The client never owns a connection. It hands a [`Quest`] (method name plus
//! parameters) to a [`Transport`] and gets back a [`Reply`] or a
//! [`TransportError`]. Connection setup, encryption, framing, and retries
//! are the transport's business.
//!
//! ```text
//!   Dispatcher ── Quest{method, params} ──▶ Transport ──▶ collector
//!              ◀── Reply{exception?, fields} ──┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::constants::{
    CONNECTION_CLOSED_CODE, DECODING_CODE, ENCODING_CODE, INVALID_CONNECTION_CODE, TIMEOUT_CODE,
    UNKNOWN_ERROR_CODE,
};

/// Lifecycle callback, invoked with the transport's connection id.
pub type ConnectionCallback = Arc<dyn Fn(u64) + Send + Sync>;

// ============================================================================
// Error Type
// ============================================================================

/// Failures raised by the transport before a usable reply arrived.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("connection closed: {0}")]
    Closed(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("decoding error: {0}")]
    Decoding(String),
    #[error("transport error {code}: {message}")]
    Other { code: i64, message: String },
}

impl TransportError {
    /// Numeric code handed to completion handlers.
    pub fn code(&self) -> i64 {
        match self {
            Self::Timeout => TIMEOUT_CODE,
            Self::Connection(_) => INVALID_CONNECTION_CODE,
            Self::Closed(_) => CONNECTION_CLOSED_CODE,
            Self::Encoding(_) => ENCODING_CODE,
            Self::Decoding(_) => DECODING_CODE,
            Self::Other { code, .. } => *code,
        }
    }

    /// Build from a raw code, picking the matching variant where one exists.
    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            TIMEOUT_CODE => Self::Timeout,
            INVALID_CONNECTION_CODE => Self::Connection(message),
            CONNECTION_CLOSED_CODE => Self::Closed(message),
            ENCODING_CODE => Self::Encoding(message),
            DECODING_CODE => Self::Decoding(message),
            _ => Self::Other { code, message },
        }
    }

    pub(crate) fn unknown(message: impl Into<String>) -> Self {
        Self::Other {
            code: UNKNOWN_ERROR_CODE,
            message: message.into(),
        }
    }
}

// ============================================================================
// Quest / Reply
// ============================================================================

/// An outbound request: a method name and a parameter object.
#[derive(Debug, Clone, PartialEq)]
pub struct Quest {
    pub method: String,
    pub params: Map<String, Value>,
}

impl Quest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Map::new(),
        }
    }

    /// Set one parameter.
    pub fn param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// A reply from the collector.
///
/// An exception reply means the collector received the request and refused
/// it; its `code` and `ex` fields say why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    exception: bool,
    fields: Map<String, Value>,
}

impl Reply {
    /// An empty, successful reply.
    pub fn ok() -> Self {
        Self::default()
    }

    /// A successful reply carrying fields.
    pub fn with_fields(fields: Map<String, Value>) -> Self {
        Self {
            exception: false,
            fields,
        }
    }

    /// A reply as decoded off the wire.
    pub fn from_parts(exception: bool, fields: Map<String, Value>) -> Self {
        Self { exception, fields }
    }

    /// An exception reply with the collector's code and message.
    pub fn exception(code: i64, ex: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("code".to_string(), Value::from(code));
        fields.insert("ex".to_string(), Value::from(ex.into()));
        Self {
            exception: true,
            fields,
        }
    }

    pub fn is_exception(&self) -> bool {
        self.exception
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Read a required integer field.
    pub fn want_int(&self, field: &str) -> Result<i64, TransportError> {
        self.fields
            .get(field)
            .and_then(Value::as_i64)
            .ok_or_else(|| TransportError::Decoding(format!("reply field `{field}` is not an integer")))
    }

    /// Read a required string field.
    pub fn want_string(&self, field: &str) -> Result<String, TransportError> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TransportError::Decoding(format!("reply field `{field}` is not a string")))
    }
}

// ============================================================================
// Transport trait
// ============================================================================

/// A request/reply channel to the collector.
///
/// Implementations must be shareable across tasks; `send` may be called
/// concurrently. The configuration hooks default to no-ops for transports
/// that have nothing to configure.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a quest and wait for its reply.
    ///
    /// `timeout` of `None` means the transport's own default.
    async fn send(&self, quest: Quest, timeout: Option<Duration>) -> Result<Reply, TransportError>;

    /// Fail fast if the request could not even be submitted right now.
    fn ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn endpoint(&self) -> String {
        String::new()
    }

    fn set_connect_timeout(&self, _timeout: Duration) {}

    fn set_quest_timeout(&self, _timeout: Duration) {}

    fn set_on_connected(&self, _callback: ConnectionCallback) {}

    fn set_on_closed(&self, _callback: ConnectionCallback) {}
}

// ============================================================================
// LoopbackTransport
// ============================================================================

#[derive(Default)]
struct LoopbackState {
    sent: Vec<Quest>,
    connect_timeout: Option<Duration>,
    quest_timeout: Option<Duration>,
    on_connected: Option<ConnectionCallback>,
    on_closed: Option<ConnectionCallback>,
    connected: bool,
}

/// In-process transport that accepts every quest and keeps a copy.
///
/// Useful for dry runs and tests. The first send fires the connected
/// callback with connection id `1`; [`LoopbackTransport::close`] fires the
/// closed callback.
#[derive(Default)]
pub struct LoopbackTransport {
    endpoint: String,
    state: Mutex<LoopbackState>,
}

impl LoopbackTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Mutex::default(),
        }
    }

    /// Every quest sent so far, oldest first.
    pub fn sent(&self) -> Vec<Quest> {
        self.state.lock().sent.clone()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.state.lock().connect_timeout
    }

    pub fn quest_timeout(&self) -> Option<Duration> {
        self.state.lock().quest_timeout
    }

    /// Drop the simulated connection.
    pub fn close(&self) {
        let callback = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.on_closed.clone()
        };
        if let Some(cb) = callback {
            cb(1);
        }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, quest: Quest, _timeout: Option<Duration>) -> Result<Reply, TransportError> {
        let connected_cb = {
            let mut state = self.state.lock();
            state.sent.push(quest);
            if state.connected {
                None
            } else {
                state.connected = true;
                state.on_connected.clone()
            }
        };
        if let Some(cb) = connected_cb {
            cb(1);
        }
        Ok(Reply::ok())
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn set_connect_timeout(&self, timeout: Duration) {
        self.state.lock().connect_timeout = Some(timeout);
    }

    fn set_quest_timeout(&self, timeout: Duration) {
        self.state.lock().quest_timeout = Some(timeout);
    }

    fn set_on_connected(&self, callback: ConnectionCallback) {
        self.state.lock().on_connected = Some(callback);
    }

    fn set_on_closed(&self, callback: ConnectionCallback) {
        self.state.lock().on_closed = Some(callback);
    }
}

// ============================================================================
// Tests
// ============================================================================
