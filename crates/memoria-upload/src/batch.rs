//! Batch scheduler
//!
//! Splits a gallery candidate set into fixed-size contiguous batches and sends them one
//! at a time. The first failed batch halts the run.

use memoria_core::models::{BatchOutcome, BatchProgress, BatchStatus, SubmissionOutcome};
use memoria_core::StoreResult;
use std::future::Future;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Zero-based position in the schedule.
    pub sequence_index: usize,
    pub assets: Vec<T>,
}

/// Partition `candidates` in order. Batch `i` holds `[i * size, (i + 1) * size)`.
pub fn schedule<T: Clone>(candidates: &[T], batch_size: usize) -> Vec<Batch<T>> {
    candidates
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(sequence_index, chunk)| Batch {
            sequence_index,
            assets: chunk.to_vec(),
        })
        .collect()
}

pub struct BatchScheduler {
    batch_size: usize,
    progress: watch::Sender<BatchProgress>,
}

impl BatchScheduler {
    pub fn new(batch_size: usize) -> Self {
        let (progress, _) = watch::channel(BatchProgress::default());
        Self {
            batch_size: batch_size.max(1),
            progress,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn schedule<T: Clone>(&self, candidates: &[T]) -> Vec<Batch<T>> {
        schedule(candidates, self.batch_size)
    }

    /// Progress updates, published before each dispatch.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> BatchProgress {
        *self.progress.borrow()
    }

    /// Send every batch in order, waiting for each response before the next dispatch.
    ///
    /// After the first failure no further batch is sent; the rest are reported as not
    /// attempted. Progress returns to idle when the run ends.
    pub async fn run_sequential<T, F, Fut>(
        &self,
        batches: Vec<Batch<T>>,
        mut send: F,
    ) -> SubmissionOutcome
    where
        F: FnMut(Batch<T>) -> Fut,
        Fut: Future<Output = StoreResult<()>>,
    {
        let total = batches.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut halted = false;

        for batch in batches {
            let batch_index = batch.sequence_index;
            let size = batch.assets.len();

            if halted {
                outcomes.push(BatchOutcome {
                    batch_index,
                    size,
                    status: BatchStatus::NotAttempted,
                    server_message: None,
                });
                continue;
            }

            self.progress.send_replace(BatchProgress {
                current: batch_index + 1,
                total,
            });
            tracing::info!(batch_index, size, total, "Dispatching batch");

            match send(batch).await {
                Ok(()) => outcomes.push(BatchOutcome {
                    batch_index,
                    size,
                    status: BatchStatus::Succeeded,
                    server_message: None,
                }),
                Err(e) => {
                    tracing::warn!(
                        batch_index,
                        size,
                        status = ?e.status(),
                        error = %e,
                        "Batch failed, halting remaining batches"
                    );
                    halted = true;
                    outcomes.push(BatchOutcome {
                        batch_index,
                        size,
                        status: BatchStatus::Failed,
                        server_message: Some(
                            e.server_message()
                                .unwrap_or("Some uploads failed. Please retry.")
                                .to_string(),
                        ),
                    });
                }
            }
        }

        self.progress.send_replace(BatchProgress::default());
        SubmissionOutcome::from_batches(outcomes)
    }
}
