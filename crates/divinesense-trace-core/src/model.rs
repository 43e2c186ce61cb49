//! Trace storage types for the tracing core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Outcome of a phase, tool call, LLM call, or whole trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Completed without error.
    Ok,
    /// Completed with an error.
    Error,
    /// The enclosing request scope was canceled.
    Canceled,
}

impl Status {
    /// Maps a status to its wire string per the Jaeger/log exporter contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::Canceled => "canceled",
        }
    }

    /// Derives OK/ERROR from the presence of an error.
    pub fn from_error(err: Option<&str>) -> Self {
        if err.is_some() {
            Status::Error
        } else {
            Status::Ok
        }
    }
}

/// A named, timed interval of progress on a trace, materialized when a
/// [`Span`](https://docs.rs/divinesense-trace-recorder) ends or when
/// `RecordPhase` completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub duration_ms: u64,
    pub status: Status,
    /// Empty when `status` is OK.
    pub error: String,
    pub metadata: HashMap<String, String>,
}

impl Phase {
    pub fn new(
        name: impl Into<String>,
        start_time_ms: i64,
        end_time_ms: i64,
        error: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_time_ms,
            end_time_ms,
            duration_ms: (end_time_ms - start_time_ms).max(0) as u64,
            status: Status::from_error(error),
            error: error.unwrap_or_default().to_string(),
            metadata,
        }
    }
}

/// One invocation of an external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub tool_type: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub duration_ms: u64,
    pub status: Status,
    pub error: String,
}

impl ToolCall {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        tool_type: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
        end_time_ms: i64,
        duration_ms: u64,
        error: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            tool_type: tool_type.into(),
            input,
            output,
            start_time_ms: end_time_ms - duration_ms as i64,
            end_time_ms,
            duration_ms,
            status: Status::from_error(error),
            error: error.unwrap_or_default().to_string(),
        }
    }
}

/// One API call to a language-model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCall {
    pub model: String,
    pub provider: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cached_tokens: u32,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub duration_ms: u64,
    pub status: Status,
    pub error: String,
    pub stream: bool,
    pub time_to_first_token_ms: Option<u64>,
}

impl LlmCall {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: impl Into<String>,
        provider: impl Into<String>,
        prompt_tokens: u32,
        completion_tokens: u32,
        cached_tokens: u32,
        end_time_ms: i64,
        duration_ms: u64,
        error: Option<&str>,
        stream: bool,
        time_to_first_token_ms: Option<u64>,
    ) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cached_tokens,
            start_time_ms: end_time_ms - duration_ms as i64,
            end_time_ms,
            duration_ms,
            status: Status::from_error(error),
            error: error.unwrap_or_default().to_string(),
            stream,
            time_to_first_token_ms,
        }
    }
}

/// An immutable snapshot of a finished (or never-sampled) trace, handed to
/// exporters. Exporters must not mutate it; nothing in this crate lets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: String,
    pub root_span_id: String,
    pub operation_name: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub status: Status,
    pub phases: Vec<Phase>,
    pub tool_calls: Vec<ToolCall>,
    pub llm_calls: Vec<LlmCall>,
    pub metadata: HashMap<String, String>,
    pub tags: HashMap<String, String>,
}

impl Default for Status {
    fn default() -> Self {
        Status::Ok
    }
}

impl Trace {
    /// A blank, non-sampled trace: all identity fields empty, all
    /// collections empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Non-sampled traces have no trace id.
    pub fn is_empty(&self) -> bool {
        self.trace_id.is_empty()
    }

    /// Combined record count, bounded by the recorder's `max_trace_size`.
    pub fn record_count(&self) -> usize {
        self.phases.len() + self.tool_calls.len() + self.llm_calls.len()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.end_time_ms - self.start_time_ms).max(0) as u64
    }

    pub fn total_tokens(&self) -> u64 {
        self.llm_calls.iter().map(|c| c.total_tokens as u64).sum()
    }

    pub fn total_cached_tokens(&self) -> u64 {
        self.llm_calls.iter().map(|c| c.cached_tokens as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_as_str_matches_wire_contract() {
        assert_eq!(Status::Ok.as_str(), "ok");
        assert_eq!(Status::Error.as_str(), "error");
        assert_eq!(Status::Canceled.as_str(), "canceled");
    }

    #[test]
    fn status_from_error_derivation() {
        assert_eq!(Status::from_error(None), Status::Ok);
        assert_eq!(Status::from_error(Some("boom")), Status::Error);
    }

    #[test]
    fn llm_call_total_tokens_invariant() {
        let call = LlmCall::new("deepseek-chat", "deepseek", 100, 50, 80, 1_000, 500, None, false, None);
        assert_eq!(call.total_tokens, 150);
    }

    #[test]
    fn empty_trace_has_blank_identity() {
        let t = Trace::empty();
        assert!(t.is_empty());
        assert!(t.trace_id.is_empty());
        assert_eq!(t.record_count(), 0);
    }
}
