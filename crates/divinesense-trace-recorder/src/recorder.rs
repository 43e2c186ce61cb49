//! Trace Recorder: the only component that mutates a trace.

use std::sync::Arc;

use divinesense_trace_core::{generate_id, now_ms, static_metadata, Status, Trace};
use divinesense_trace_exporters::Exporter;

use crate::config::RecorderConfig;
use crate::context::Scope;
use crate::sampler::Sampler;
use crate::span::Span;
use crate::trace_handle::{LiveTrace, TraceHandle};

/// Creates, mutates, and finishes traces; owns the exporter and the
/// sampling decision.
pub struct Recorder {
    exporter: Arc<dyn Exporter>,
    sampler: Sampler,
    max_trace_size: usize,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            exporter: config.exporter,
            sampler: Sampler::new(config.sample_rate),
            max_trace_size: config.max_trace_size,
        }
    }

    /// Starts a trace, sampling it in or out. Never fails: a non-sampled
    /// call returns an empty handle whose Record* calls are no-ops and
    /// the original scope unchanged.
    pub fn start_trace(&self, scope: &Scope, operation_name: impl Into<String>) -> (TraceHandle, Scope) {
        if !self.sampler.should_sample() {
            return (TraceHandle::empty(), scope.clone());
        }

        let meta = static_metadata();
        let mut trace = Trace::empty();
        trace.trace_id = generate_id();
        trace.root_span_id = generate_id();
        trace.operation_name = operation_name.into();
        trace.start_time_ms = now_ms();
        trace.metadata.insert("hostname".to_string(), meta.hostname.clone());
        trace.metadata.insert("runtime_version".to_string(), meta.runtime_version.clone());
        trace.metadata.insert("cpu_count".to_string(), meta.cpu_count.to_string());

        let live = Arc::new(LiveTrace::new(trace, self.max_trace_size));
        let handle = TraceHandle::from_live(live);
        let new_scope = crate::context::with_context(scope, handle.clone());
        (handle, new_scope)
    }

    /// Starts a span under the trace attached to `scope`, or a null span if
    /// `scope` carries none.
    pub fn start_span(&self, scope: &Scope, name: impl Into<String>) -> Span {
        match crate::context::from_context(scope) {
            Some(handle) => Span::new(handle.live().cloned(), name.into()),
            None => Span::new(None, name.into()),
        }
    }

    /// Finishes the trace with `OK` status and hands it to the exporter on a
    /// freshly spawned task. A no-op on an empty handle.
    pub fn finish(&self, trace: TraceHandle) {
        self.complete(trace, Status::Ok, None);
    }

    /// Finishes the trace with `ERROR` status, recording `error` under the
    /// `error` metadata key.
    pub fn finish_with_error(&self, trace: TraceHandle, error: impl std::fmt::Display) {
        self.complete(trace, Status::Error, Some(error.to_string()));
    }

    /// Finishes the trace with `CANCELED` status. Callers that detect a
    /// canceled request scope should call this instead of `finish`.
    pub fn finish_canceled(&self, trace: TraceHandle) {
        self.complete(trace, Status::Canceled, None);
    }

    fn complete(&self, trace: TraceHandle, status: Status, error: Option<String>) {
        let Some(live) = trace.live() else { return };
        let snapshot = live.complete(status, error);

        let exporter = self.exporter.clone();
        tokio::spawn(async move {
            exporter.export(Arc::new(snapshot)).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divinesense_trace_exporters::{CacheClient, CachedExporter, InMemoryCache};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingExporter(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Exporter for CountingExporter {
        async fn export(&self, _trace: Arc<Trace>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn happy_path_records_and_exports_a_populated_trace() {
        let count = Arc::new(AtomicUsize::new(0));
        let recorder = Recorder::new(RecorderConfig::new().with_exporter(Arc::new(CountingExporter(count.clone()))));

        let scope = Scope::new();
        let (trace, _scope) = recorder.start_trace(&scope, "chat");
        assert!(!trace.is_empty());

        let _: Result<(), String> = trace.record_phase("plan", || Ok(()));
        trace.record_tool_call(
            "memo_search",
            "retrieval",
            serde_json::json!({"q": "x"}),
            serde_json::json!({"n": 3}),
            50,
            None,
        );
        trace.record_llm_call("deepseek-chat", "deepseek", 100, 50, 80, 500, None);

        recorder.finish(trace);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_sample_rate_normalizes_to_always_sample() {
        let count = Arc::new(AtomicUsize::new(0));
        let recorder = Recorder::new(
            RecorderConfig::new()
                .with_exporter(Arc::new(CountingExporter(count.clone())))
                .with_sample_rate(0.0),
        );

        let scope = Scope::new();
        let (trace, _scope) = recorder.start_trace(&scope, "chat");
        assert!(!trace.is_empty());

        let _: Result<(), String> = trace.record_phase("plan", || Ok(()));
        recorder.finish(trace);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn traces_beyond_the_sampled_fraction_never_reach_the_exporter() {
        let count = Arc::new(AtomicUsize::new(0));
        let recorder = Recorder::new(
            RecorderConfig::new()
                .with_exporter(Arc::new(CountingExporter(count.clone())))
                // threshold = 0.0001 * 1_000_000 = 100: the first 100 draws
                // from a fresh counter sample, the next 100 don't.
                .with_sample_rate(0.0001),
        );

        let scope = Scope::new();
        let mut sampled = 0;
        let mut unsampled = 0;
        for _ in 0..200 {
            let (trace, new_scope) = recorder.start_trace(&scope, "chat");
            if trace.is_empty() {
                unsampled += 1;
                assert!(crate::context::from_context(&new_scope).is_none());
            } else {
                sampled += 1;
            }
            recorder.finish(trace);
        }

        assert_eq!(sampled, 100);
        assert_eq!(unsampled, 100);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn error_path_sets_error_status_and_metadata() {
        let cache = Arc::new(InMemoryCache::new());
        let inner = Arc::new(CountingExporter(Arc::new(AtomicUsize::new(0))));
        let exporter = Arc::new(CachedExporter::new(cache.clone() as Arc<dyn CacheClient>, inner));
        let recorder = Recorder::new(RecorderConfig::new().with_exporter(exporter));

        let scope = Scope::new();
        let (trace, _scope) = recorder.start_trace(&scope, "op");
        let trace_id = trace.trace_id();

        let _: Result<(), &str> = trace.record_phase("fail", || Err("boom"));
        recorder.finish_with_error(trace, "outer");

        tokio::time::sleep(Duration::from_millis(20)).await;
        let summary = cache.get(&format!("trace:{trace_id}")).expect("summary cached");
        let parsed: serde_json::Value = serde_json::from_str(&summary).unwrap();
        assert_eq!(parsed["status"], "error");
    }

    #[tokio::test]
    async fn size_cap_truncates_excess_phases() {
        let recorder = Recorder::new(RecorderConfig::new().with_max_trace_size(3));
        let scope = Scope::new();
        let (trace, _scope) = recorder.start_trace(&scope, "op");

        for _ in 0..5 {
            let _: Result<(), String> = trace.record_phase("step", || Ok(()));
        }

        assert_eq!(trace.live().unwrap().state_for_test().phases.len(), 3);
    }
}
