//! Decorator exporter that writes a summary to a key-value cache before
//! delegating to a wrapped exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use divinesense_trace_core::Trace;

use crate::{CacheClient, Exporter};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Wraps another exporter with a best-effort cache write of a trace
/// summary under key `trace:{trace_id}`.
pub struct CachedExporter {
    cache: Arc<dyn CacheClient>,
    inner: Arc<dyn Exporter>,
}

impl CachedExporter {
    pub fn new(cache: Arc<dyn CacheClient>, inner: Arc<dyn Exporter>) -> Self {
        Self { cache, inner }
    }
}

fn summary_json(trace: &Trace) -> String {
    serde_json::json!({
        "trace_id": trace.trace_id,
        "operation": trace.operation_name,
        "duration_ms": trace.duration_ms(),
        "status": trace.status.as_str(),
    })
    .to_string()
}

#[async_trait]
impl Exporter for CachedExporter {
    async fn export(&self, trace: Arc<Trace>) {
        let key = format!("trace:{}", trace.trace_id);
        let value = summary_json(&trace);

        match tokio::time::timeout(CACHE_WRITE_TIMEOUT, self.cache.set(key, value, CACHE_TTL)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(trace_id = %trace.trace_id, error = %e, "cache write failed");
            }
            Err(_) => {
                tracing::error!(trace_id = %trace.trace_id, "cache write timed out");
            }
        }

        self.inner.export(trace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCache, LogExporter};
    use divinesense_trace_core::Status;

    #[tokio::test]
    async fn writes_summary_and_delegates() {
        let cache = Arc::new(InMemoryCache::new());
        let exporter = CachedExporter::new(cache.clone(), Arc::new(LogExporter::new()));

        let mut trace = Trace::empty();
        trace.trace_id = "trace-xyz".into();
        trace.operation_name = "chat".into();
        trace.start_time_ms = 0;
        trace.end_time_ms = 42;
        trace.status = Status::Ok;

        exporter.export(Arc::new(trace)).await;

        let stored = cache.get("trace:trace-xyz").expect("summary written");
        let parsed: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed["trace_id"], "trace-xyz");
        assert_eq!(parsed["operation"], "chat");
        assert_eq!(parsed["duration_ms"], 42);
        assert_eq!(parsed["status"], "ok");
    }

    struct FailingCache;

    #[async_trait]
    impl CacheClient for FailingCache {
        async fn set(
            &self,
            _key: String,
            _value: String,
            _ttl: Duration,
        ) -> Result<(), crate::CacheError> {
            Err(crate::CacheError::Failed("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn cache_failure_does_not_block_delegate_export() {
        let exporter = CachedExporter::new(Arc::new(FailingCache), Arc::new(LogExporter::new()));
        let mut trace = Trace::empty();
        trace.trace_id = "trace-1".into();
        // Should not panic even though the cache write fails.
        exporter.export(Arc::new(trace)).await;
    }
}
