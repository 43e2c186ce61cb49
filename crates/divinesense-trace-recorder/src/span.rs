//! Span: a lightweight front for producing a Phase. A span has no
//! independent storage on the trace; it materializes only when `end` runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use divinesense_trace_core::{now_ms, Phase};

use crate::trace_handle::LiveTrace;

/// A child unit of work within a trace, created by `Recorder::start_span`.
/// Ending a span with no live trace behind it (`StartSpan` on an empty
/// scope) is a no-op.
pub struct Span {
    live: Option<Arc<LiveTrace>>,
    name: String,
    start_time_ms: i64,
    metadata: Mutex<HashMap<String, String>>,
}

impl Span {
    pub(crate) fn new(live: Option<Arc<LiveTrace>>, name: String) -> Self {
        Self {
            live,
            name,
            start_time_ms: now_ms(),
            metadata: Mutex::new(HashMap::new()),
        }
    }

    /// The trace id of the enclosing trace, or empty for a null span.
    pub fn trace_id(&self) -> String {
        self.live.as_ref().map(|l| l.trace_id()).unwrap_or_default()
    }

    /// Attaches a metadata key/value to the eventual Phase. No-op on a null
    /// span.
    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        if self.live.is_none() {
            return;
        }
        let Ok(mut metadata) = self.metadata.lock() else {
            tracing::warn!("span metadata lock poisoned, dropping metadata");
            return;
        };
        metadata.insert(key.into(), value.into());
    }

    /// Ends the span, recording it as a Phase on the enclosing trace. No-op
    /// on a null span.
    pub fn end(self, error: Option<&str>) {
        let Some(live) = self.live else { return };
        let end_time_ms = now_ms();
        let metadata = self.metadata.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        live.append_phase(Phase::new(self.name, self.start_time_ms, end_time_ms, error, metadata));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divinesense_trace_core::Trace;

    #[test]
    fn null_span_is_inert() {
        let span = Span::new(None, "retrieving".to_string());
        span.set_metadata("k", "v");
        assert!(span.trace_id().is_empty());
        span.end(None);
    }

    #[test]
    fn ending_a_span_appends_a_phase_with_its_metadata() {
        let live = Arc::new(LiveTrace::new(Trace::empty(), 10));
        let span = Span::new(Some(live.clone()), "retrieving".to_string());
        span.set_metadata("source", "memo_index");
        span.end(None);

        let phases = &live.state_for_test().phases;
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].name, "retrieving");
        assert_eq!(phases[0].metadata.get("source").map(String::as_str), Some("memo_index"));
    }

    #[test]
    fn a_span_ended_with_an_error_records_error_status() {
        let live = Arc::new(LiveTrace::new(Trace::empty(), 10));
        let span = Span::new(Some(live.clone()), "planning".to_string());
        span.end(Some("timed out"));

        let phases = &live.state_for_test().phases;
        assert_eq!(phases[0].error, "timed out");
    }
}
