//! Converts a finished trace to a Jaeger wire span, batches it, and POSTs
//! the accumulated batch to a Jaeger collector's HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;
use divinesense_trace_core::{self as core, Trace};
use divinesense_trace_batcher::{Batcher, BatcherConfig, OnFlush};
use serde::Serialize;
use std::sync::Arc;

use crate::Exporter;

const DEFAULT_ENDPOINT: &str = "http://localhost:14268/api/traces";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`JaegerExporter`].
#[derive(Debug, Clone)]
pub struct JaegerConfig {
    pub endpoint: String,
    pub service_name: String,
    pub batch_size: usize,
    pub batch_timeout: Duration,
    pub max_queue_size: usize,
}

impl Default for JaegerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_name: "divinesense".to_string(),
            batch_size: 50,
            batch_timeout: Duration::from_secs(5),
            max_queue_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TagValue {
    String { value: String },
    Int64 { value: i64 },
}

#[derive(Debug, Clone, Serialize)]
struct JaegerTag {
    key: String,
    #[serde(flatten)]
    value: TagValue,
}

impl JaegerTag {
    fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: TagValue::String { value: value.into() },
        }
    }

    fn int64(key: impl Into<String>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: TagValue::Int64 { value },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct JaegerLogField {
    key: String,
    value: String,
}

#[derive(Debug, Clone, Serialize)]
struct JaegerLog {
    timestamp: i64,
    fields: Vec<JaegerLogField>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct JaegerSpan {
    trace_id: String,
    span_id: String,
    parent_span_id: String,
    operation_name: String,
    start_time: i64,
    duration: i64,
    tags: Vec<JaegerTag>,
    logs: Vec<JaegerLog>,
}

#[derive(Debug, Clone, Serialize)]
struct JaegerProcess {
    #[serde(rename = "serviceName")]
    service_name: String,
    tags: Vec<JaegerTag>,
}

#[derive(Debug, Clone, Serialize)]
struct JaegerBatch {
    spans: Vec<JaegerSpan>,
    process: JaegerProcess,
}

fn to_jaeger_span(trace: &Trace) -> JaegerSpan {
    let duration_micros = trace.duration_ms() as i64 * 1000;
    // Start time is computed directly in microseconds to avoid mixing units.
    let start_time = core::now_micros() - duration_micros;

    let mut tags: Vec<JaegerTag> = trace
        .tags
        .iter()
        .map(|(k, v)| JaegerTag::string(k.clone(), v.clone()))
        .chain(
            trace
                .metadata
                .iter()
                .map(|(k, v)| JaegerTag::string(k.clone(), v.clone())),
        )
        .collect();
    tags.push(JaegerTag::string("status", trace.status.as_str()));

    let mut logs: Vec<JaegerLog> = trace
        .phases
        .iter()
        .map(|phase| JaegerLog {
            timestamp: phase.start_time_ms * 1000,
            fields: vec![
                JaegerLogField { key: "event".into(), value: "phase".into() },
                JaegerLogField { key: "phase_name".into(), value: phase.name.clone() },
                JaegerLogField { key: "duration_ms".into(), value: phase.duration_ms.to_string() },
            ],
        })
        .collect();

    logs.extend(trace.tool_calls.iter().map(|call| JaegerLog {
        timestamp: call.start_time_ms * 1000,
        fields: vec![
            JaegerLogField { key: "event".into(), value: "tool_call".into() },
            JaegerLogField { key: "tool_name".into(), value: call.name.clone() },
            JaegerLogField { key: "tool_type".into(), value: call.tool_type.clone() },
            JaegerLogField { key: "duration_ms".into(), value: call.duration_ms.to_string() },
        ],
    }));

    JaegerSpan {
        trace_id: core::narrow_to_64bit_hex(&trace.trace_id),
        span_id: core::narrow_to_64bit_hex(&trace.root_span_id),
        parent_span_id: String::new(),
        operation_name: trace.operation_name.clone(),
        start_time,
        duration: duration_micros,
        tags,
        logs,
    }
}

fn process_block(service_name: &str) -> JaegerProcess {
    let meta = core::static_metadata();
    JaegerProcess {
        service_name: service_name.to_string(),
        tags: vec![
            JaegerTag::string("hostname", meta.hostname.clone()),
            JaegerTag::string("runtime_version", meta.runtime_version.clone()),
            JaegerTag::int64("cpu_count", meta.cpu_count as i64),
        ],
    }
}

async fn post_batch(client: reqwest::Client, endpoint: String, service_name: String, spans: Vec<JaegerSpan>) {
    let body = vec![JaegerBatch { spans, process: process_block(&service_name) }];

    let response = match client.post(&endpoint).json(&body).send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!(endpoint = %endpoint, error = %e, "jaeger export transport failure");
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        tracing::error!(endpoint = %endpoint, status = %status, body = %text, "jaeger export rejected");
    }
}

/// Exports finished traces to a Jaeger HTTP collector.
pub struct JaegerExporter {
    config: JaegerConfig,
    client: reqwest::Client,
    batcher: Batcher<JaegerSpan>,
}

impl JaegerExporter {
    pub fn new(config: JaegerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        let batcher = Batcher::new(BatcherConfig {
            batch_size: config.batch_size,
            batch_timeout: config.batch_timeout,
            max_queue_size: config.max_queue_size,
        });

        Self { config, client, batcher }
    }

    /// Closes the underlying batcher, flushing any spans still queued.
    pub async fn close(&self) {
        self.batcher.close().await;
    }

    /// Number of spans dropped because the batcher queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.batcher.dropped_count()
    }
}

#[async_trait]
impl Exporter for JaegerExporter {
    async fn export(&self, trace: Arc<Trace>) {
        let span = to_jaeger_span(&trace);

        let client = self.client.clone();
        let endpoint = self.config.endpoint.clone();
        let service_name = self.config.service_name.clone();
        let on_flush: OnFlush<JaegerSpan> = Arc::new(move |spans| {
            let client = client.clone();
            let endpoint = endpoint.clone();
            let service_name = service_name.clone();
            tokio::spawn(post_batch(client, endpoint, service_name, spans));
        });

        self.batcher.add(span, on_flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divinesense_trace_core::{Phase, Status};
    use std::collections::HashMap;

    fn sample_trace() -> Trace {
        let mut trace = Trace::empty();
        trace.trace_id = "4bf92f3577b34da6a3ce929d0e0e4736".into();
        trace.root_span_id = "00f067aa0ba902b7".into();
        trace.operation_name = "chat".into();
        trace.start_time_ms = 1_000;
        trace.end_time_ms = 1_500;
        trace.status = Status::Ok;
        trace.tags.insert("env".into(), "prod".into());
        trace.phases.push(Phase::new("plan", 1_000, 1_050, None, HashMap::new()));
        trace
    }

    #[test]
    fn narrows_trace_and_span_ids_to_16_hex_chars() {
        let trace = sample_trace();
        let span = to_jaeger_span(&trace);
        assert_eq!(span.trace_id.len(), 16);
        assert_eq!(span.span_id.len(), 16);
        assert!(span.parent_span_id.is_empty());
    }

    #[test]
    fn duration_and_start_time_are_consistent_microseconds() {
        let trace = sample_trace();
        let span = to_jaeger_span(&trace);
        assert_eq!(span.duration, 500_000);
        // now_micros() - duration == start_time, within a generous slack
        // for wall-clock time elapsed during the test itself.
        let expected_start = core::now_micros() - span.duration;
        assert!((span.start_time - expected_start).abs() < 1_000_000);
    }

    #[test]
    fn tags_include_status_and_metadata() {
        let trace = sample_trace();
        let span = to_jaeger_span(&trace);
        assert!(span.tags.iter().any(|t| t.key == "status"));
        assert!(span.tags.iter().any(|t| t.key == "env"));
    }

    #[test]
    fn logs_include_one_entry_per_phase() {
        let trace = sample_trace();
        let span = to_jaeger_span(&trace);
        assert_eq!(span.logs.len(), 1);
        assert!(span.logs[0].fields.iter().any(|f| f.key == "phase_name" && f.value == "plan"));
    }

    #[tokio::test]
    async fn export_enqueues_without_panicking() {
        let exporter = JaegerExporter::new(JaegerConfig {
            batch_size: 1,
            batch_timeout: Duration::from_millis(50),
            max_queue_size: 10,
            ..Default::default()
        });
        exporter.export(Arc::new(sample_trace())).await;
        exporter.close().await;
    }
}
