//! End-to-end request tracing for the DivineSense AI assistant platform.
//!
//! Wires together the trace model, recorder, batcher, and exporters from
//! their individual crates behind one entry point. Application code
//! typically only needs [`prelude`]:
//!
//! ```no_run
//! use divinesense_trace::prelude::*;
//!
//! # async fn run() {
//! let recorder = Recorder::new(RecorderConfig::new());
//! let scope = Scope::new();
//! let (trace, _scope) = recorder.start_trace(&scope, "chat");
//! trace.record_tool_call("memo_search", "retrieval", serde_json::json!({}), serde_json::json!({}), 50, None);
//! recorder.finish(trace);
//! # }
//! ```

pub use divinesense_trace_core::{
    generate_id, narrow_to_64bit_hex, now_micros, now_ms, static_metadata, LlmCall, Phase,
    StaticMetadata, Status, ToolCall, Trace,
};

pub use divinesense_trace_batcher::{Batcher, BatcherConfig, OnFlush};

pub use divinesense_trace_exporters::{
    CacheClient, CacheError, CachedExporter, CompositeExporter, Exporter, InMemoryCache,
    JaegerConfig, JaegerExporter, LogExporter, NoopCache, OtlpConfig, OtlpExporter,
};

pub use divinesense_trace_recorder::{from_context, with_context, Recorder, RecorderConfig, Scope, Span, TraceHandle};

/// Re-exports everything application code typically needs in one `use`.
pub mod prelude {
    pub use crate::{
        from_context, with_context, CacheClient, CachedExporter, CompositeExporter, Exporter,
        InMemoryCache, JaegerConfig, JaegerExporter, LogExporter, NoopCache, OtlpConfig,
        OtlpExporter, Recorder, RecorderConfig, Scope, Span, Trace, TraceHandle,
    };
}
