//! OTLP export layer.

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetryLayer;

/// Shuts down the tracer provider on drop, flushing pending spans.
pub struct OtelGuard {
    provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("OTel shutdown error: {e}");
        }
    }
}

/// Build an OpenTelemetry tracing layer and its guard.
///
/// Must be called inside a Tokio runtime: the tonic exporter spawns onto it.
/// Sampling is parent-based, with the root ratio taken from
/// `OTEL_TRACES_SAMPLER_ARG`.
pub fn otel_layer<S>(service_name: &str) -> (OpenTelemetryLayer<S, SdkTracer>, OtelGuard)
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .expect("failed to build OTLP exporter");

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let ratio = crate::sample_ratio(std::env::var("OTEL_TRACES_SAMPLER_ARG").ok().as_deref());
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(ratio))))
        .with_resource(resource)
        .build();

    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer("rum");
    let layer = tracing_opentelemetry::layer().with_tracer(tracer);

    (layer, OtelGuard { provider })
}
