//! The live, mutable trace and the handle application code holds onto it
//! through. `TraceHandle::empty()` is the non-sampled case: every method is
//! a no-op.

use std::sync::{Arc, Mutex};

use divinesense_trace_core::{now_ms, LlmCall, Phase, Status, ToolCall, Trace};

/// The mutable trace state behind a [`TraceHandle`], guarded by a single
/// mutex. Critical sections are append-only and tiny, so a plain mutex
/// suffices over a read/write lock.
#[derive(Debug)]
pub(crate) struct LiveTrace {
    state: Mutex<Trace>,
    max_trace_size: usize,
}

impl LiveTrace {
    pub(crate) fn new(trace: Trace, max_trace_size: usize) -> Self {
        Self {
            state: Mutex::new(trace),
            max_trace_size,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_for_test() -> Self {
        let mut trace = Trace::empty();
        trace.trace_id = divinesense_trace_core::generate_id();
        trace.root_span_id = divinesense_trace_core::generate_id();
        Self::new(trace, 1000)
    }

    #[cfg(test)]
    pub(crate) fn state_for_test(&self) -> Trace {
        self.state.lock().unwrap().clone()
    }

    fn at_capacity(trace: &Trace, max_trace_size: usize) -> bool {
        trace.record_count() >= max_trace_size
    }

    pub(crate) fn append_phase(&self, phase: Phase) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, dropping phase");
            return;
        };
        if Self::at_capacity(&state, self.max_trace_size) {
            return;
        }
        state.phases.push(phase);
    }

    pub(crate) fn append_tool_call(&self, call: ToolCall) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, dropping tool call");
            return;
        };
        if Self::at_capacity(&state, self.max_trace_size) {
            return;
        }
        state.tool_calls.push(call);
    }

    pub(crate) fn append_llm_call(&self, call: LlmCall) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, dropping llm call");
            return;
        };
        if Self::at_capacity(&state, self.max_trace_size) {
            return;
        }
        state.llm_calls.push(call);
    }

    pub(crate) fn set_tag(&self, key: String, value: String) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, dropping tag");
            return;
        };
        state.tags.insert(key, value);
    }

    pub(crate) fn set_metadata(&self, key: String, value: String) {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, dropping metadata");
            return;
        };
        state.metadata.insert(key, value);
    }

    pub(crate) fn trace_id(&self) -> String {
        let Ok(state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, returning empty trace id");
            return String::new();
        };
        state.trace_id.clone()
    }

    pub(crate) fn root_span_id(&self) -> String {
        let Ok(state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, returning empty root span id");
            return String::new();
        };
        state.root_span_id.clone()
    }

    /// Sets the terminal status (and, on error, the `error` metadata key),
    /// then returns an immutable snapshot. Consuming `self` here (via
    /// the complete call) is what makes post-finish isolation hold: once
    /// this returns, nothing holds a handle that can append to the trace.
    pub(crate) fn complete(&self, status: Status, error: Option<String>) -> Trace {
        let Ok(mut state) = self.state.lock() else {
            tracing::warn!("trace state lock poisoned, exporting an empty snapshot");
            return Trace::empty();
        };
        state.end_time_ms = now_ms();
        state.status = status;
        if let Some(error) = error {
            state.metadata.insert("error".to_string(), error);
        }
        state.clone()
    }
}

/// A handle to a trace being recorded, or a no-op handle for non-sampled
/// traces. Cloning shares the same underlying trace.
#[derive(Debug, Clone, Default)]
pub struct TraceHandle {
    inner: Option<Arc<LiveTrace>>,
}

impl TraceHandle {
    pub(crate) fn from_live(live: Arc<LiveTrace>) -> Self {
        Self { inner: Some(live) }
    }

    /// A handle that records nothing; all operations are no-ops.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// True for a handle produced by a non-sampled `StartTrace`.
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub(crate) fn live(&self) -> Option<&Arc<LiveTrace>> {
        self.inner.as_ref()
    }

    pub fn trace_id(&self) -> String {
        self.inner.as_ref().map(|l| l.trace_id()).unwrap_or_default()
    }

    /// Runs `work`, timing it and recording the result as a Phase. Runs
    /// `work` and returns its result even on a no-op handle.
    pub fn record_phase<F, E>(&self, name: impl Into<String>, work: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<(), E>,
        E: std::fmt::Display,
    {
        let start = now_ms();
        let result = work();
        let end = now_ms();

        if let Some(live) = &self.inner {
            let error = result.as_ref().err().map(|e| e.to_string());
            live.append_phase(Phase::new(name.into(), start, end, error.as_deref(), Default::default()));
        }

        result
    }

    /// The async counterpart to [`record_phase`](Self::record_phase), for
    /// work that suspends (a tool call, an LLM request) instead of blocking.
    /// The per-trace lock is not held across `work`; it's acquired only for
    /// the final append, same as the synchronous path.
    pub async fn record_phase_async<F, Fut, E>(&self, name: impl Into<String>, work: F) -> Result<(), E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let start = now_ms();
        let result = work().await;
        let end = now_ms();

        if let Some(live) = &self.inner {
            let error = result.as_ref().err().map(|e| e.to_string());
            live.append_phase(Phase::new(name.into(), start, end, error.as_deref(), Default::default()));
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_tool_call(
        &self,
        name: impl Into<String>,
        tool_type: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
        duration_ms: u64,
        error: Option<&str>,
    ) {
        let Some(live) = &self.inner else { return };
        let end_time_ms = now_ms();
        live.append_tool_call(ToolCall::new(name, tool_type, input, output, end_time_ms, duration_ms, error));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_llm_call(
        &self,
        model: impl Into<String>,
        provider: impl Into<String>,
        prompt_tokens: u32,
        completion_tokens: u32,
        cached_tokens: u32,
        duration_ms: u64,
        error: Option<&str>,
    ) {
        let Some(live) = &self.inner else { return };
        let end_time_ms = now_ms();
        live.append_llm_call(LlmCall::new(
            model,
            provider,
            prompt_tokens,
            completion_tokens,
            cached_tokens,
            end_time_ms,
            duration_ms,
            error,
            false,
            None,
        ));
    }

    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(live) = &self.inner {
            live.set_tag(key.into(), value.into());
        }
    }

    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(live) = &self.inner {
            live.set_metadata(key.into(), value.into());
        }
    }
}
