//! Sending signed requests and settling their outcome.
//!
//! A request ends in exactly one of three ways, whichever mode it was sent in:
//!
//! ```text
//!   Building ─▶ Signed ─▶ Sent ─┬─▶ Succeeded        reply, no exception
//!                               ├─▶ TransportFailed  no usable reply (incl. timeout)
//!                               └─▶ RemoteRejected   exception reply {code, ex}
//! ```
//!
//! Modes:
//!
//! - [`Dispatcher::send`]: awaits the round trip. The wait is always
//!   bounded, by the caller's timeout or the dispatcher default.
//! - [`Dispatcher::submit`]: returns once the request is accepted and invokes
//!   a completion handler exactly once from a runtime task.
//! - [`Dispatcher::submit_pending`]: same, but hands back an awaitable
//!   [`PendingReport`].
//!
//! Nothing is retried here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::constants::{OK_CODE, UNKNOWN_ERROR_CODE};
use crate::error::{ReportError, Result};
use crate::sign::SignedRequest;
use crate::transport::{Quest, Reply, Transport, TransportError};

/// Completion callback: `(code, message)`, `(0, "")` on success.
pub type CompletionHandler = Box<dyn FnOnce(i64, String) + Send + 'static>;

// ============================================================================
// Options
// ============================================================================

/// Per-call options.
///
/// No handler means the call waits for the outcome. A handler switches the
/// call to fire-and-notify; a timeout bounds the wait in either mode.
#[derive(Default)]
pub struct ReportOptions {
    timeout: Option<Duration>,
    on_complete: Option<CompletionHandler>,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_complete<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(i64, String) + Send + 'static,
    {
        self.on_complete = Some(Box::new(handler));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_async(&self) -> bool {
        self.on_complete.is_some()
    }

    fn validate(&self) -> Result<()> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ReportError::invalid_argument("timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportOptions")
            .field("timeout", &self.timeout)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

// ============================================================================
// Outcome mapping
// ============================================================================

/// Map a transport result onto the reporting error model.
pub fn settle(result: std::result::Result<Reply, TransportError>) -> Result<()> {
    let reply = result?;
    if !reply.is_exception() {
        return Ok(());
    }
    Err(ReportError::RemoteRejected {
        code: reply.want_int("code")?,
        message: reply.want_string("ex")?,
    })
}

/// Runs a handler exactly once: with the outcome, or, if the task driving
/// the request is dropped first, with an abandonment error.
struct Completion {
    handler: Option<CompletionHandler>,
}

impl Completion {
    fn new(handler: CompletionHandler) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    fn finish(mut self, outcome: &Result<()>) {
        if let Some(handler) = self.handler.take() {
            match outcome {
                Ok(()) => handler(OK_CODE, String::new()),
                Err(e) => handler(e.code(), e.message()),
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            tracing::warn!("report abandoned before completion");
            handler(UNKNOWN_ERROR_CODE, "report abandoned before completion".to_string());
        }
    }
}

/// Awaitable outcome of a submitted report.
#[must_use = "a PendingReport does nothing unless awaited"]
pub struct PendingReport {
    rx: oneshot::Receiver<Result<()>>,
}

impl Future for PendingReport {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match futures::ready!(Pin::new(&mut self.rx).poll(cx)) {
            Ok(outcome) => Poll::Ready(outcome),
            Err(_) => Poll::Ready(Err(TransportError::Closed("report task dropped".into()).into())),
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// A request that passed the pre-send checks and can be driven to completion.
struct Accepted {
    runtime: tokio::runtime::Handle,
    round_trip: BoxFuture<'static, Result<()>>,
}

/// Submits signed requests through a shared [`Transport`].
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    default_timeout: Mutex<Duration>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, default_timeout: Duration) -> Self {
        Self {
            transport,
            default_timeout: Mutex::new(default_timeout),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Bound applied when a call gives no timeout.
    pub fn default_timeout(&self) -> Duration {
        *self.default_timeout.lock()
    }

    pub fn set_default_timeout(&self, timeout: Duration) {
        *self.default_timeout.lock() = timeout;
    }

    /// Send in whichever mode `options` selects.
    ///
    /// Without a handler this resolves with the outcome. With one it
    /// resolves as soon as the request is accepted, and the handler
    /// receives the outcome later.
    #[tracing::instrument(
        skip_all,
        name = "rum.dispatch",
        fields(pid = request.project_id, events = request.events.len(), mode = tracing::field::Empty)
    )]
    pub async fn dispatch(&self, request: SignedRequest, options: ReportOptions) -> Result<()> {
        options.validate()?;
        let ReportOptions { timeout, on_complete } = options;
        match on_complete {
            None => {
                tracing::Span::current().record("mode", "sync");
                self.send(&request, timeout).await
            }
            Some(handler) => {
                tracing::Span::current().record("mode", "async");
                self.submit(&request, timeout, handler)
            }
        }
    }

    /// Send and wait for the outcome.
    pub async fn send(&self, request: &SignedRequest, timeout: Option<Duration>) -> Result<()> {
        let quest = self.prepare(request)?;
        round_trip(Arc::clone(&self.transport), quest, timeout, self.bound(timeout)).await
    }

    /// Send without waiting; `handler` gets the outcome exactly once.
    ///
    /// An `Err` here means the request was never sent, and the handler is
    /// dropped without being called.
    pub fn submit(
        &self,
        request: &SignedRequest,
        timeout: Option<Duration>,
        handler: CompletionHandler,
    ) -> Result<()> {
        let accepted = self.accept(request, timeout)?;
        let completion = Completion::new(handler);
        accepted.runtime.spawn(async move {
            let outcome = accepted.round_trip.await;
            completion.finish(&outcome);
        });
        Ok(())
    }

    /// Send without waiting; await the returned value for the outcome.
    pub fn submit_pending(
        &self,
        request: &SignedRequest,
        timeout: Option<Duration>,
    ) -> Result<PendingReport> {
        let accepted = self.accept(request, timeout)?;
        let (tx, rx) = oneshot::channel();
        accepted.runtime.spawn(async move {
            let _ = tx.send(accepted.round_trip.await);
        });
        Ok(PendingReport { rx })
    }

    fn bound(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or_else(|| self.default_timeout())
    }

    fn prepare(&self, request: &SignedRequest) -> Result<Quest> {
        self.transport.ready()?;
        Ok(request.to_quest()?)
    }

    fn accept(&self, request: &SignedRequest, timeout: Option<Duration>) -> Result<Accepted> {
        let quest = self.prepare(request)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::unknown(format!("no async runtime: {e}")))?;
        let transport = Arc::clone(&self.transport);
        let bound = self.bound(timeout);
        Ok(Accepted {
            runtime,
            round_trip: Box::pin(round_trip(transport, quest, timeout, bound)),
        })
    }
}

/// One bounded round trip, logged and settled.
async fn round_trip(
    transport: Arc<dyn Transport>,
    quest: Quest,
    timeout: Option<Duration>,
    bound: Duration,
) -> Result<()> {
    let started = Instant::now();
    tracing::debug!(method = %quest.method, timeout_ms = bound.as_millis() as u64, "sending");

    let result = match tokio::time::timeout(bound, transport.send(quest, timeout)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    };
    let outcome = settle(result);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(()) => tracing::debug!(elapsed_ms, "report accepted"),
        Err(ReportError::RemoteRejected { code, message }) => {
            tracing::warn!(code, %message, elapsed_ms, "report rejected by collector")
        }
        Err(e) => tracing::warn!(code = e.code(), error = %e, elapsed_ms, "report transport failure"),
    }
    outcome
}

// ============================================================================
// Tests
// ============================================================================
