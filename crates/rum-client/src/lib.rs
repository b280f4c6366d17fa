//! RUM custom-event reporting client
//!
//! Builds signed batches of custom events and reports them to the RUM
//! collector over a caller-supplied [`Transport`], either waiting for the
//! outcome or handing it to a completion handler.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rum_client::{ClientConfig, LoopbackTransport, ReportOptions, RumClient};
//! use rum_types::Attributes;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(41000015, "secret", "collector:13609");
//! let client = RumClient::new(config, Arc::new(LoopbackTransport::new("collector:13609")))?;
//!
//! let mut attrs = Attributes::new();
//! attrs.insert("aaa".into(), "bbb".into());
//!
//! // Wait for the collector's answer.
//! client.send_custom_event("error", attrs.clone(), ReportOptions::new()).await?;
//!
//! // Or get called back.
//! client
//!     .send_custom_event(
//!         "error",
//!         attrs,
//!         ReportOptions::new().on_complete(|code, msg| println!("{code} {msg}")),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod payload;
pub mod sign;
pub mod transport;

pub use client::RumClient;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{CompletionHandler, Dispatcher, PendingReport, ReportOptions, settle};
pub use error::{ErrorKind, ReportError, Result};
pub use payload::{BuildReport, EventPayloadBuilder};
pub use sign::{RequestSigner, SignedRequest, compute_signature};
pub use transport::{ConnectionCallback, LoopbackTransport, Quest, Reply, Transport, TransportError};
