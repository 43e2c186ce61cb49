//! Recorder configuration, with a fluent builder in the style of the
//! observability config used elsewhere in this codebase.

use std::sync::Arc;

use divinesense_trace_exporters::{Exporter, LogExporter};

const DEFAULT_MAX_TRACE_SIZE: i64 = 1000;

/// Configuration accepted by [`crate::Recorder::new`].
pub struct RecorderConfig {
    pub(crate) exporter: Arc<dyn Exporter>,
    pub(crate) sample_rate: f64,
    pub(crate) max_trace_size: usize,
}

impl RecorderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The exporter finished traces are handed to. Default: a log exporter
    /// at INFO level.
    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// Fraction of traces to record. Values at or below 0 and at or above 1
    /// both normalize to "always sample" at the sampler; only values
    /// strictly between 0 and 1 are honored as a partial rate.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Maximum combined phase/tool-call/LLM-call count per trace. Values
    /// `<= 0` are normalized to the default of 1000.
    pub fn with_max_trace_size(mut self, max_trace_size: i64) -> Self {
        self.max_trace_size = normalize_max_trace_size(max_trace_size);
        self
    }
}

fn normalize_max_trace_size(value: i64) -> usize {
    if value <= 0 {
        DEFAULT_MAX_TRACE_SIZE as usize
    } else {
        value as usize
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            exporter: Arc::new(LogExporter::new()),
            sample_rate: 1.0,
            max_trace_size: DEFAULT_MAX_TRACE_SIZE as usize,
        }
    }
}
