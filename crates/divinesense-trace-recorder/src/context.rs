//! Request Context Carrier: attaches a trace handle to a per-request
//! scope so nested code can find it without a global "current trace"
//! registry.

use crate::trace_handle::TraceHandle;

/// A per-request scope carrying at most one trace handle. `Scope` values are
/// cheap to clone; cloning never duplicates the underlying trace.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    trace: Option<TraceHandle>,
}

impl Scope {
    /// An empty scope with no attached trace.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns a new scope with `trace` attached, leaving `scope` untouched.
pub fn with_context(_scope: &Scope, trace: TraceHandle) -> Scope {
    Scope { trace: Some(trace) }
}

/// Returns the trace attached to `scope`, or `None` if the scope is empty or
/// carries no trace.
pub fn from_context(scope: &Scope) -> Option<TraceHandle> {
    scope.trace.clone()
}
