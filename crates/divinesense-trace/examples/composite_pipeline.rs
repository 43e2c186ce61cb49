//! Wires a log exporter and a Jaeger exporter behind a composite, with a
//! cache summary decorator in front of both.
//!
//! Run with: cargo run --example composite_pipeline

use std::sync::Arc;

use divinesense_trace::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let log_exporter: Arc<dyn Exporter> = Arc::new(LogExporter::new());
    let jaeger_exporter: Arc<dyn Exporter> = Arc::new(JaegerExporter::new(JaegerConfig {
        service_name: "divinesense-demo".to_string(),
        ..Default::default()
    }));
    let composite: Arc<dyn Exporter> = Arc::new(CompositeExporter::new(vec![log_exporter, jaeger_exporter]));
    let cached: Arc<dyn Exporter> = Arc::new(CachedExporter::new(Arc::new(InMemoryCache::new()), composite));

    let recorder = Recorder::new(RecorderConfig::new().with_exporter(cached));
    let scope = Scope::new();
    let (trace, _scope) = recorder.start_trace(&scope, "chat");

    trace.record_tool_call(
        "memo_search",
        "retrieval",
        serde_json::json!({"q": "pricing"}),
        serde_json::json!({"hits": 2}),
        30,
        None,
    );

    recorder.finish(trace);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}
