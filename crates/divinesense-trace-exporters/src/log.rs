//! Structured-log exporter: one `ai_trace` record per trace, plus
//! `slow_phase` and `tool_error` records, emitted through `tracing` at
//! INFO/WARN/ERROR. The application wires a JSON-formatting
//! `tracing_subscriber` layer so these land on stdout as newline-delimited
//! JSON; this crate never touches stdout directly, only `tracing` macros.

use std::sync::Arc;

use async_trait::async_trait;
use divinesense_trace_core::{Phase, ToolCall, Trace};

use crate::Exporter;

/// Phases slower than this are logged as `slow_phase` at WARN.
const SLOW_PHASE_THRESHOLD_MS: u64 = 100;

/// Exports finished traces as structured log records to stdout.
#[derive(Debug, Default)]
pub struct LogExporter;

impl LogExporter {
    pub fn new() -> Self {
        Self
    }
}

fn is_slow_phase(phase: &Phase) -> bool {
    phase.duration_ms > SLOW_PHASE_THRESHOLD_MS
}

fn is_failed_tool_call(call: &ToolCall) -> bool {
    call.status == divinesense_trace_core::Status::Error
}

#[async_trait]
impl Exporter for LogExporter {
    async fn export(&self, trace: Arc<Trace>) {
        tracing::info!(
            trace_id = %trace.trace_id,
            operation = %trace.operation_name,
            status = %trace.status.as_str(),
            duration_ms = trace.duration_ms(),
            phases = trace.phases.len(),
            tool_calls = trace.tool_calls.len(),
            llm_calls = trace.llm_calls.len(),
            total_tokens = trace.total_tokens(),
            cached_tokens = trace.total_cached_tokens(),
            "ai_trace"
        );

        for phase in trace.phases.iter().filter(|p| is_slow_phase(p)) {
            tracing::warn!(
                trace_id = %trace.trace_id,
                phase = %phase.name,
                duration_ms = phase.duration_ms,
                "slow_phase"
            );
        }

        for call in trace.tool_calls.iter().filter(|c| is_failed_tool_call(c)) {
            tracing::error!(
                trace_id = %trace.trace_id,
                tool = %call.name,
                tool_type = %call.tool_type,
                error = %call.error,
                "tool_error"
            );
        }
    }
}
