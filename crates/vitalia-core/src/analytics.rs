//! AnalyticsSink trait definition.

use vitalia_types::event::EngagementEvent;

/// Sink for derived engagement events (chosen product, purchase intent).
///
/// Fire-and-forget: the engine never waits for a response and the sink must
/// swallow its own delivery errors.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: EngagementEvent);
}

/// Sink that drops every event. Useful for deployments without reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn record(&self, _event: EngagementEvent) {}
}
