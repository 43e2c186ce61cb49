//! OTLP exporter stub: accepts the config, batches like every other
//! exporter, but only debug-logs the batch until a real OTLP/HTTP or
//! OTLP/gRPC encoder is wired up against a concrete collector.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use divinesense_trace_core::Trace;
use divinesense_trace_batcher::{Batcher, BatcherConfig, OnFlush};

use crate::Exporter;

const DEFAULT_ENDPOINT: &str = "http://localhost:4318/v1/traces";

/// Configuration for [`OtlpExporter`].
#[derive(Debug, Clone)]
pub struct OtlpConfig {
    pub endpoint: String,
    pub batch_size: usize,
    pub batch_timeout: Duration,
    pub max_queue_size: usize,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: 50,
            batch_timeout: Duration::from_secs(5),
            max_queue_size: 1000,
        }
    }
}

/// Batches finished traces and logs them in place of a real OTLP export.
pub struct OtlpExporter {
    config: OtlpConfig,
    batcher: Batcher<Arc<Trace>>,
}

impl OtlpExporter {
    pub fn new(config: OtlpConfig) -> Self {
        let batcher = Batcher::new(BatcherConfig {
            batch_size: config.batch_size,
            batch_timeout: config.batch_timeout,
            max_queue_size: config.max_queue_size,
        });
        Self { config, batcher }
    }

    pub async fn close(&self) {
        self.batcher.close().await;
    }

    pub fn dropped_count(&self) -> u64 {
        self.batcher.dropped_count()
    }
}

#[async_trait]
impl Exporter for OtlpExporter {
    async fn export(&self, trace: Arc<Trace>) {
        let endpoint = self.config.endpoint.clone();
        let on_flush: OnFlush<Arc<Trace>> = Arc::new(move |traces| {
            tracing::debug!(
                endpoint = %endpoint,
                batch_size = traces.len(),
                "otlp export not implemented, batch discarded"
            );
        });

        self.batcher.add(trace, on_flush);
    }
}
