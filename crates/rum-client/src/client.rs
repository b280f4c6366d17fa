//! The reporting client.
//!
//! ```text
//!   send_custom_event(s) ─▶ EventPayloadBuilder ─▶ RequestSigner ─▶ Dispatcher ─▶ Transport
//!                            (session, ids)          (pid, secret)     (sync/async)
//! ```

use std::sync::Arc;
use std::time::Duration;

use rum_types::{Attributes, RawEvent};

use crate::config::{ClientConfig, ConfigError};
use crate::constants::SDK_VERSION;
use crate::dispatch::{Dispatcher, PendingReport, ReportOptions};
use crate::error::Result;
use crate::payload::EventPayloadBuilder;
use crate::sign::{RequestSigner, SignedRequest};
use crate::transport::Transport;

/// Reports custom events to the collector through a [`Transport`].
///
/// One client owns one session identity and one id allocator. Methods take
/// `&self`, so a client can be shared behind an `Arc`.
pub struct RumClient {
    payload: EventPayloadBuilder,
    signer: RequestSigner,
    dispatcher: Dispatcher,
}

impl RumClient {
    /// Validate `config` and push its timeouts down to the transport.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        transport.set_connect_timeout(config.connect_timeout());
        transport.set_quest_timeout(config.quest_timeout());

        tracing::info!(
            pid = config.project_id,
            endpoint = %config.endpoint,
            sdk = SDK_VERSION,
            "rum client ready"
        );

        Ok(Self {
            payload: EventPayloadBuilder::new(config.source_tag.clone()),
            signer: RequestSigner::new(config.project_id, config.secret_key.clone()),
            dispatcher: Dispatcher::new(transport, config.quest_timeout()),
        })
    }

    // ── Session ─────────────────────────────────────────────────────────

    pub fn set_session_id(&self, id: i64) {
        self.payload.session().set_session_id(id);
    }

    pub fn set_reporting_id(&self, id: impl Into<String>) {
        self.payload.session().set_reporting_id(id);
    }

    pub fn session_id(&self) -> i64 {
        self.payload.session().session_id()
    }

    pub fn reporting_id(&self) -> String {
        self.payload.session().reporting_id()
    }

    // ── Transport passthrough ───────────────────────────────────────────

    pub fn endpoint(&self) -> String {
        self.dispatcher.transport().endpoint()
    }

    pub fn set_connect_timeout(&self, timeout: Duration) {
        self.dispatcher.transport().set_connect_timeout(timeout);
    }

    /// Also becomes this client's default wait bound.
    pub fn set_quest_timeout(&self, timeout: Duration) {
        self.dispatcher.set_default_timeout(timeout);
        self.dispatcher.transport().set_quest_timeout(timeout);
    }

    pub fn set_on_connected_callback<F>(&self, callback: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.dispatcher.transport().set_on_connected(Arc::new(callback));
    }

    pub fn set_on_closed_callback<F>(&self, callback: F)
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.dispatcher.transport().set_on_closed(Arc::new(callback));
    }

    // ── Building ────────────────────────────────────────────────────────

    /// Stamp and sign a batch without sending it.
    pub fn build_request(&self, events: Vec<RawEvent>) -> Result<SignedRequest> {
        let events = self.payload.build_event_list(events)?;
        Ok(self.signer.sign(events))
    }

    // ── Sending ─────────────────────────────────────────────────────────

    /// Report one event.
    #[tracing::instrument(skip(self, attrs, options), name = "rum.send_custom_event")]
    pub async fn send_custom_event(
        &self,
        name: &str,
        attrs: Attributes,
        options: ReportOptions,
    ) -> Result<()> {
        let event = self.payload.build_event(name, attrs);
        let request = self.signer.sign(vec![event]);
        self.dispatcher.dispatch(request, options).await
    }

    /// Report a batch. Entries without a name or attributes are skipped.
    #[tracing::instrument(skip_all, name = "rum.send_custom_events", fields(entries = events.len()))]
    pub async fn send_custom_events(
        &self,
        events: Vec<RawEvent>,
        options: ReportOptions,
    ) -> Result<()> {
        let request = self.build_request(events)?;
        self.dispatcher.dispatch(request, options).await
    }

    /// Report a batch in the background; await the result for the outcome.
    pub fn send_custom_events_pending(
        &self,
        events: Vec<RawEvent>,
        timeout: Option<Duration>,
    ) -> Result<PendingReport> {
        let request = self.build_request(events)?;
        self.dispatcher.submit_pending(&request, timeout)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::LoopbackTransport;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("aaa".into(), "bbb".into());
        attrs.insert("bbb".into(), 123.into());
        attrs
    }

    fn client() -> (RumClient, Arc<LoopbackTransport>) {
        let transport = Arc::new(LoopbackTransport::new("loopback:13609"));
        let config = ClientConfig::new(41000015, "affc562c", "loopback:13609");
        let client = RumClient::new(config, transport.clone()).unwrap();
        (client, transport)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let transport = Arc::new(LoopbackTransport::default());
        let config = ClientConfig::new(41000015, "", "");
        assert!(RumClient::new(config, transport).is_err());
    }

    #[test]
    fn test_timeouts_pushed_to_transport() {
        let (client, transport) = client();
        assert_eq!(transport.quest_timeout(), Some(Duration::from_secs(5)));

        client.set_quest_timeout(Duration::from_millis(750));
        client.set_connect_timeout(Duration::from_millis(250));
        assert_eq!(transport.quest_timeout(), Some(Duration::from_millis(750)));
        assert_eq!(transport.connect_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(client.dispatcher.default_timeout(), Duration::from_millis(750));
        assert_eq!(client.endpoint(), "loopback:13609");
    }

    #[test]
    fn test_build_request_signed_and_stamped() {
        let (client, _) = client();
        client.set_reporting_id("ttttttt-rid");
        client.set_session_id(123456);

        let request = client
            .build_request(vec![RawEvent::new("error", attrs())])
            .unwrap();
        assert_eq!(request.project_id, 41000015);
        assert_eq!(
            request.signature,
            crate::sign::compute_signature(41000015, "affc562c", request.salt)
        );
        assert_eq!(request.events[0].session_id, 123456);
        assert_eq!(request.events[0].reporting_id, "ttttttt-rid");
    }

    #[tokio::test]
    async fn test_send_custom_event_sync() {
        let (client, transport) = client();
        client
            .send_custom_event("error", attrs(), ReportOptions::new())
            .await
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "adds");
        assert_ne!(client.session_id(), 0);
        assert!(!client.reporting_id().is_empty());
    }

    #[tokio::test]
    async fn test_send_custom_events_empty_rejected() {
        let (client, transport) = client();
        let err = client
            .send_custom_events(vec![RawEvent { ev: Some("x".into()), attrs: None }], ReportOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_pending_send() {
        let (client, transport) = client();
        let pending = client
            .send_custom_events_pending(vec![RawEvent::new("error", attrs())], None)
            .unwrap();
        pending.await.unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_callbacks_passthrough() {
        let (client, transport) = client();
        let connected = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicU64::new(0));
        {
            let connected = Arc::clone(&connected);
            client.set_on_connected_callback(move |id| {
                connected.store(id, Ordering::SeqCst);
            });
            let closed = Arc::clone(&closed);
            client.set_on_closed_callback(move |id| {
                closed.store(id, Ordering::SeqCst);
            });
        }

        client
            .send_custom_event("error", attrs(), ReportOptions::new())
            .await
            .unwrap();
        transport.close();

        assert_eq!(connected.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
