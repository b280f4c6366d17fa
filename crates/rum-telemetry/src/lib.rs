//! Tracing setup for the RUM SDK.
//!
//! [`init_tracing`] installs a `tracing_subscriber` registry with an
//! `EnvFilter` (from `RUST_LOG`, falling back to the given directive) and an
//! stderr fmt layer. Built with the `telemetry` feature, it also adds an
//! OTLP export layer when the standard OTel environment variables ask for one:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 cargo run -p rum-cli --features telemetry
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to explicitly disable even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

/// Keeps exporters alive; drop at shutdown to flush.
#[must_use = "dropping the guard stops span export"]
pub struct TracingGuard {
    #[cfg(feature = "telemetry")]
    _otel: Option<OtelGuard>,
}

/// Install the global subscriber.
///
/// `default_directive` applies when `RUST_LOG` is unset, e.g. `"info"`.
pub fn init_tracing(service_name: &str, default_directive: &str) -> TracingGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    #[cfg(feature = "telemetry")]
    let (otel, guard) = if otel_enabled() {
        let (layer, guard) = otel_layer(service_name);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };
    #[cfg(feature = "telemetry")]
    let registry = registry.with(otel);

    registry.init();
    tracing::debug!(service = service_name, "tracing initialized");

    TracingGuard {
        #[cfg(feature = "telemetry")]
        _otel: guard,
    }
}

/// Check whether OTel export should be enabled, from the process environment.
pub fn otel_enabled() -> bool {
    otel_enabled_with(|key| std::env::var(key).ok())
}

/// Decide OTel activation from an environment lookup.
///
/// Enabled when `OTEL_SDK_DISABLED` is not `"true"` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `"none"`.
pub fn otel_enabled_with(env: impl Fn(&str) -> Option<String>) -> bool {
    // Explicit disable takes priority
    if env("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }

    if env("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }

    env("OTEL_TRACES_EXPORTER").is_some_and(|exporter| !exporter.eq_ignore_ascii_case("none"))
}

/// Trace sampling ratio from `OTEL_TRACES_SAMPLER_ARG`, clamped to `[0, 1]`.
///
/// Unset or unparsable means sample everything.
pub fn sample_ratio(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 1.0))
        .unwrap_or(1.0)
}
