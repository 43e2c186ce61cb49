//! Thread-safe trace recording API: `StartTrace`, `StartSpan`,
//! `RecordPhase`/`RecordToolCall`/`RecordLLMCall`, `Finish`, and the request
//! context carrier that makes the active trace reachable from nested code.

mod config;
mod context;
mod recorder;
mod sampler;
mod span;
mod trace_handle;

pub use config::RecorderConfig;
pub use context::{from_context, with_context, Scope};
pub use recorder::Recorder;
pub use span::Span;
pub use trace_handle::TraceHandle;
