//! Bounded channel + single consumer that accumulates items until a size or
//! time threshold is crossed, then invokes a flush callback.
//!
//! `Add` never blocks: on a full queue the item is dropped and counted, so
//! the batcher can never push backpressure onto the recording path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Callback invoked with an accumulated batch when it is flushed.
pub type OnFlush<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;

/// Configuration for a [`Batcher`].
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Number of items that trigger an immediate flush.
    pub batch_size: usize,
    /// Maximum time a non-empty batch waits before being flushed.
    pub batch_timeout: Duration,
    /// Bound on the number of items that may sit in the queue at once.
    pub max_queue_size: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_timeout: Duration::from_secs(5),
            max_queue_size: 1000,
        }
    }
}

struct BatchItem<T> {
    payload: T,
    on_flush: OnFlush<T>,
}

/// A bounded, time-and-size triggered queue. One consumer task is started
/// at construction and runs until [`Batcher::close`] drains it.
pub struct Batcher<T: Send + 'static> {
    sender: StdMutex<Option<mpsc::Sender<BatchItem<T>>>>,
    consumer: StdMutex<Option<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
}

impl<T: Send + 'static> Batcher<T> {
    /// Creates a new batcher and spawns its consumer task.
    pub fn new(config: BatcherConfig) -> Self {
        let capacity = config.max_queue_size.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let batch_size = config.batch_size.max(1);
        let handle = tokio::spawn(run_consumer(rx, batch_size, config.batch_timeout));

        Self {
            sender: StdMutex::new(Some(tx)),
            consumer: StdMutex::new(Some(handle)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueues an item with the callback to invoke when its batch flushes.
    /// Never blocks; returns `false` and bumps [`Batcher::dropped_count`] if
    /// the queue is full or the batcher has been closed.
    pub fn add(&self, payload: T, on_flush: OnFlush<T>) -> bool {
        let Ok(guard) = self.sender.lock() else {
            tracing::warn!("batcher sender lock poisoned, dropping item");
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        let Some(tx) = guard.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match tx.try_send(BatchItem { payload, on_flush }) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("batcher queue full, dropping item");
                false
            }
        }
    }

    /// Number of items dropped on admission since construction.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Closes the input channel and waits for the consumer to flush any
    /// remaining items and exit.
    pub async fn close(&self) {
        let Ok(mut sender) = self.sender.lock() else {
            tracing::warn!("batcher sender lock poisoned during close");
            return;
        };
        sender.take();
        drop(sender);

        let Ok(mut consumer) = self.consumer.lock() else {
            tracing::warn!("batcher consumer lock poisoned during close");
            return;
        };
        let handle = consumer.take();
        drop(consumer);
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run_consumer<T: Send + 'static>(
    mut rx: mpsc::Receiver<BatchItem<T>>,
    batch_size: usize,
    batch_timeout: Duration,
) {
    let mut buffer: Vec<T> = Vec::new();
    let mut last_on_flush: Option<OnFlush<T>> = None;
    let mut ticker = tokio::time::interval(batch_timeout);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Consume the immediate first tick so the real timeout starts counting
    // from construction, not from the first enqueued item.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            maybe_item = rx.recv() => {
                match maybe_item {
                    Some(item) => {
                        last_on_flush = Some(item.on_flush.clone());
                        buffer.push(item.payload);
                        if buffer.len() >= batch_size {
                            flush(&mut buffer, &last_on_flush);
                        }
                    }
                    None => {
                        flush(&mut buffer, &last_on_flush);
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                flush(&mut buffer, &last_on_flush);
            }
        }
    }
}

fn flush<T>(buffer: &mut Vec<T>, on_flush: &Option<OnFlush<T>>) {
    if buffer.is_empty() {
        return;
    }
    let batch = std::mem::take(buffer);
    if let Some(cb) = on_flush {
        cb(batch);
    }
}
