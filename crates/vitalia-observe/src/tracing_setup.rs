//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use vitalia_observe::tracing_setup::{TracingOptions, init_tracing};
//!
//! // Human-readable logging only
//! init_tracing(TracingOptions::default()).unwrap();
//!
//! // JSON logs plus OpenTelemetry export to stdout (local development)
//! init_tracing(TracingOptions { json: true, otel: true }).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Output switches for [`init_tracing`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOptions {
    /// Emit newline-delimited JSON instead of the human-readable format.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter. Suitable for
    /// local development; swap the exporter for OTLP in production.
    pub otel: bool,
}

/// Initialize the global tracing subscriber.
///
/// Installs a `fmt` layer with target visibility and span close timing, so
/// per-turn `handle_message` latency shows up without extra plumbing. The
/// filter comes from `RUST_LOG`, falling back to `info` when unset.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or if
/// the OTel pipeline fails to initialize.
pub fn init_tracing(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let tracer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("vitalia");

        // Keep the provider for shutdown and register it globally.
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        Some(tracer)
    } else {
        None
    };

    // The OTel layer is generic over the subscriber stack it joins, so
    // each output mode composes its full stack in one place.
    if options.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .with(tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t)))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .with(tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t)))
            .try_init()?;
    }

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// Call before process exit so buffered spans are exported. A no-op when
/// OTel was never enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_installs_global_once() {
        assert!(
            init_tracing(TracingOptions {
                json: false,
                otel: true
            })
            .is_ok()
        );
        // The global subscriber can only be installed once per process
        assert!(
            init_tracing(TracingOptions {
                json: true,
                otel: false
            })
            .is_err()
        );
        shutdown_tracing();
    }
}
