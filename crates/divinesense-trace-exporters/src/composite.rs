//! Fan-out exporter: spawns one task per child and waits for all to
//! return before returning itself. A child panic or error never prevents
//! the others from completing.

use std::sync::Arc;

use async_trait::async_trait;
use divinesense_trace_core::Trace;

use crate::Exporter;

/// Exports to N child exporters concurrently.
pub struct CompositeExporter {
    children: Vec<Arc<dyn Exporter>>,
}

impl CompositeExporter {
    pub fn new(children: Vec<Arc<dyn Exporter>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl Exporter for CompositeExporter {
    async fn export(&self, trace: Arc<Trace>) {
        let tasks = self.children.iter().cloned().map(|child| {
            let trace = trace.clone();
            tokio::spawn(async move { child.export(trace).await })
        });

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "composite exporter child task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExporter(Arc<AtomicUsize>);

    #[async_trait]
    impl Exporter for CountingExporter {
        async fn export(&self, _trace: Arc<Trace>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingExporter;

    #[async_trait]
    impl Exporter for PanickingExporter {
        async fn export(&self, _trace: Arc<Trace>) {
            panic!("child exporter blew up");
        }
    }

    #[tokio::test]
    async fn fans_out_to_every_child() {
        let counter = Arc::new(AtomicUsize::new(0));
        let composite = CompositeExporter::new(vec![
            Arc::new(CountingExporter(counter.clone())),
            Arc::new(CountingExporter(counter.clone())),
            Arc::new(CountingExporter(counter.clone())),
        ]);

        composite.export(Arc::new(Trace::empty())).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn a_panicking_child_does_not_stop_the_others() {
        let counter = Arc::new(AtomicUsize::new(0));
        let composite = CompositeExporter::new(vec![
            Arc::new(CountingExporter(counter.clone())),
            Arc::new(PanickingExporter),
            Arc::new(CountingExporter(counter.clone())),
        ]);

        composite.export(Arc::new(Trace::empty())).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
