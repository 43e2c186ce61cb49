//! Traces a single chat request end to end and exports it as structured
//! logs.
//!
//! Run with: cargo run --example simple_trace

use std::sync::Arc;

use divinesense_trace::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let recorder = Recorder::new(RecorderConfig::new().with_exporter(Arc::new(LogExporter::new())));
    let scope = Scope::new();

    let (trace, scope) = recorder.start_trace(&scope, "chat");

    let _: Result<(), String> = trace.record_phase("plan", || Ok(()));

    let span = recorder.start_span(&scope, "retrieving");
    span.set_metadata("source", "memo_index");
    span.end(None);

    trace.record_tool_call(
        "memo_search",
        "retrieval",
        serde_json::json!({"q": "what did we decide about pricing?"}),
        serde_json::json!({"hits": 3}),
        50,
        None,
    );

    trace.record_llm_call("deepseek-chat", "deepseek", 100, 50, 80, 500, None);

    trace.set_tag("env", "demo");
    recorder.finish(trace);

    // Give the spawned export task a moment to run before the process exits.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
