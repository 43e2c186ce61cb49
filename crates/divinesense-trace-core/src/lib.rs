//! Passive data model and ID/format utilities for the DivineSense tracing
//! core: [`Trace`], [`Phase`], [`ToolCall`], [`LlmCall`], [`Status`], plus
//! ID generation and hex-narrowing. No component in this crate
//! mutates anything after construction — that is the Recorder's job.

mod ids;
mod metadata;
mod model;

pub use ids::{generate_id, narrow_to_64bit_hex, now_micros, now_ms};
pub use metadata::{static_metadata, StaticMetadata};
pub use model::{LlmCall, Phase, Status, ToolCall, Trace};
