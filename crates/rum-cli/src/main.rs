//! `rum`: build, sign, and test-send RUM custom events.
//!
//! Usage:
//!   # Print the signed request for one event
//!   rum --pid 41000015 --secret KEY --event error --attr aaa=bbb --attr bbb=123
//!
//!   # Credentials from a RON config, batch from a JSON file
//!   rum --config rum.ron --batch events.json
//!
//!   # Push through the loopback transport and report the outcome
//!   rum --config rum.ron --event error --send --async

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::oneshot;

use rum_client::{ClientConfig, LoopbackTransport, ReportOptions, RumClient};
use rum_types::{AttributeValue, Attributes, RawEvent};

/// Build and sign RUM custom events.
#[derive(Parser, Debug)]
#[command(name = "rum")]
#[command(about = "Build, sign, and test-send RUM custom events")]
struct Args {
    /// RON config file with project credentials
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Project id (overrides config)
    #[arg(long)]
    pid: Option<i32>,

    /// Project secret key (overrides config)
    #[arg(long)]
    secret: Option<String>,

    /// Collector endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Event name; repeat for several events sharing the same attributes
    #[arg(short, long = "event")]
    events: Vec<String>,

    /// Attribute as KEY=VALUE; numbers and booleans are typed
    #[arg(short, long = "attr")]
    attrs: Vec<String>,

    /// JSON file holding a list of {"ev": ..., "attrs": {...}} entries, or - for stdin
    #[arg(short, long)]
    batch: Option<String>,

    /// Fixed session id
    #[arg(long)]
    session_id: Option<i64>,

    /// Fixed reporting id
    #[arg(long)]
    reporting_id: Option<String>,

    /// Send through the loopback transport instead of only printing
    #[arg(long)]
    send: bool,

    /// With --send, report through a completion handler
    #[arg(long = "async", requires = "send")]
    async_mode: bool,

    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _tracing = rum_telemetry::init_tracing("rum-cli", "warn");
    let args = Args::parse();

    let config = resolve_config(&args)?;
    let transport = Arc::new(LoopbackTransport::new(config.endpoint.clone()));
    let client = RumClient::new(config, transport.clone())?;

    if let Some(sid) = args.session_id {
        client.set_session_id(sid);
    }
    if let Some(rid) = &args.reporting_id {
        client.set_reporting_id(rid.clone());
    }

    let events = collect_events(&args)?;
    tracing::debug!(events = events.len(), send = args.send, "collected events");

    if !args.send {
        let request = client.build_request(events)?;
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let mut options = ReportOptions::new();
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    if args.async_mode {
        let (tx, rx) = oneshot::channel();
        options = options.on_complete(move |code, msg| {
            let _ = tx.send((code, msg));
        });
        client.send_custom_events(events, options).await?;
        let (code, msg) = rx.await.context("completion handler dropped")?;
        println!("completed: code={code} message={msg:?}");
    } else {
        client.send_custom_events(events, options).await?;
        println!("sent");
    }

    for quest in transport.sent() {
        println!("{}", serde_json::to_string_pretty(&quest.params)?);
    }
    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let (Some(pid), Some(secret)) = (args.pid, args.secret.as_ref()) else {
                bail!("either --config or both --pid and --secret are required");
            };
            ClientConfig::new(pid, secret.clone(), String::new())
        }
    };

    if let Some(pid) = args.pid {
        config.project_id = pid;
    }
    if let Some(secret) = &args.secret {
        config.secret_key = secret.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    config.validate()?;
    Ok(config)
}

fn collect_events(args: &Args) -> Result<Vec<RawEvent>> {
    let mut attrs = Attributes::new();
    for raw in &args.attrs {
        let (key, value) = parse_attr(raw)?;
        attrs.insert(key, value);
    }

    let mut events: Vec<RawEvent> = args
        .events
        .iter()
        .map(|name| RawEvent::new(name.clone(), attrs.clone()))
        .collect();

    if let Some(source) = &args.batch {
        let text = if source == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(source).with_context(|| format!("reading batch {source}"))?
        };
        let batch: Vec<RawEvent> = serde_json::from_str(&text).context("parsing batch JSON")?;
        events.extend(batch);
    }

    if events.is_empty() {
        bail!("nothing to send: pass --event or --batch");
    }
    Ok(events)
}

/// Parse `KEY=VALUE`, typing the value as bool, integer, float, or string.
fn parse_attr(raw: &str) -> Result<(String, AttributeValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("attribute `{raw}` is not KEY=VALUE");
    };
    if key.is_empty() {
        bail!("attribute `{raw}` has an empty key");
    }

    let typed = if let Ok(b) = value.parse::<bool>() {
        AttributeValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        AttributeValue::Int(i)
    } else if let Ok(f) = value.parse::<f64>() {
        AttributeValue::Float(f)
    } else {
        AttributeValue::String(value.to_string())
    };
    Ok((key.to_string(), typed))
}
