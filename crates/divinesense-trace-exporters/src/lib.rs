//! Exporters that transform a finished trace into a backend-specific
//! payload and ship it. Every exporter is best-effort: failures are
//! logged, never propagated, and never retried in this core.

mod cache;
mod cached;
mod composite;
mod jaeger;
mod log;
mod otlp;

pub use cache::{CacheClient, CacheError, InMemoryCache, NoopCache};
pub use cached::CachedExporter;
pub use composite::CompositeExporter;
pub use jaeger::{JaegerConfig, JaegerExporter};
pub use log::LogExporter;
pub use otlp::{OtlpConfig, OtlpExporter};

use std::sync::Arc;

use async_trait::async_trait;
use divinesense_trace_core::Trace;

/// A sink that consumes a finished trace. Implementations MUST return
/// promptly and MUST NOT mutate the trace.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, trace: Arc<Trace>);
}
