//! Submission results
//!
//! Batch-level outcomes of a gallery upload and record-level outcomes of a submit.

use serde::{Deserialize, Serialize};

use super::asset::EntityKey;
use crate::error::UploadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Succeeded,
    Failed,
    /// Skipped because an earlier batch failed.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Zero-based position of the batch in the schedule.
    pub batch_index: usize,
    /// Number of photos in the batch.
    pub size: usize,
    pub status: BatchStatus,
    pub server_message: Option<String>,
}

/// Aggregate of one sequential batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub batches: Vec<BatchOutcome>,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub first_error: Option<String>,
    /// Photos durably stored by successful batches.
    pub persisted_photos: usize,
    /// Photos in the failed batch and every batch after it.
    pub unsent_photos: usize,
}

impl SubmissionOutcome {
    pub fn from_batches(batches: Vec<BatchOutcome>) -> Self {
        let mut outcome = SubmissionOutcome::default();
        for b in &batches {
            match b.status {
                BatchStatus::Succeeded => {
                    outcome.succeeded_count += 1;
                    outcome.persisted_photos += b.size;
                }
                BatchStatus::Failed => {
                    outcome.failed_count += 1;
                    outcome.unsent_photos += b.size;
                    if outcome.first_error.is_none() {
                        outcome.first_error = b.server_message.clone();
                    }
                }
                BatchStatus::NotAttempted => outcome.unsent_photos += b.size,
            }
        }
        outcome.batches = batches;
        outcome
    }

    pub fn is_success(&self) -> bool {
        self.failed_count == 0 && self.unsent_photos == 0
    }

    /// Index of the batch that halted the run.
    pub fn failed_batch(&self) -> Option<usize> {
        self.batches
            .iter()
            .find(|b| b.status == BatchStatus::Failed)
            .map(|b| b.batch_index)
    }
}

/// Batch progress as `(current, total)`. `current` is 1-based and is published before the
/// batch is dispatched; `(0, 0)` means idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RecordResult {
    /// New portrait stored through the combined create request.
    Created,
    /// Existing portrait replaced.
    Replaced,
    /// Gallery photos uploaded in batches.
    Uploaded { persisted: usize, unsent: usize },
    /// Stored gallery photos removed.
    Deleted { count: usize },
    Failed { message: String },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub entity: EntityKey,
    pub result: RecordResult,
}

/// Everything a submit produced, per record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub outcomes: Vec<RecordOutcome>,
    /// Present when a gallery was submitted.
    pub gallery: Option<SubmissionOutcome>,
}

impl SubmitReport {
    pub fn is_success(&self) -> bool {
        let records_ok = self
            .outcomes
            .iter()
            .all(|o| !matches!(o.result, RecordResult::Failed { .. }));
        let gallery_ok = self.gallery.as_ref().map(|g| g.is_success()).unwrap_or(true);
        records_ok && gallery_ok
    }

    pub fn failed(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, RecordResult::Failed { .. }))
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                !matches!(
                    o.result,
                    RecordResult::Failed { .. } | RecordResult::Unchanged
                )
            })
            .count()
    }

    /// First attributable failure message, tagged with its entity.
    pub fn first_error(&self) -> Option<String> {
        if let Some(o) = self.failed().next() {
            if let RecordResult::Failed { message } = &o.result {
                return Some(format!("{}\n{}", o.entity, message));
            }
        }
        let gallery = self.gallery.as_ref()?;
        let index = gallery.failed_batch()?;
        Some(format!(
            "Batch {}: {}",
            index + 1,
            gallery.first_error.as_deref().unwrap_or("Upload failed.")
        ))
    }

    /// Turn a report with any failure into [`UploadError::SubmitPartialFailure`].
    pub fn into_result(self) -> Result<SubmitReport, UploadError> {
        if self.is_success() {
            return Ok(self);
        }
        let (succeeded, failed) = match &self.gallery {
            Some(g) => (g.persisted_photos, g.unsent_photos),
            None => (self.succeeded_count(), self.failed().count()),
        };
        Err(UploadError::SubmitPartialFailure {
            succeeded,
            failed,
            first_error: self.first_error(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(i: usize, size: usize, status: BatchStatus) -> BatchOutcome {
        BatchOutcome {
            batch_index: i,
            size,
            status,
            server_message: (status == BatchStatus::Failed).then(|| "disk full".to_string()),
        }
    }

    #[test]
    fn test_aggregate_halted_run() {
        let outcome = SubmissionOutcome::from_batches(vec![
            batch(0, 5, BatchStatus::Succeeded),
            batch(1, 5, BatchStatus::Failed),
            batch(2, 2, BatchStatus::NotAttempted),
        ]);
        assert_eq!(outcome.succeeded_count, 1);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.persisted_photos, 5);
        assert_eq!(outcome.unsent_photos, 7);
        assert_eq!(outcome.first_error.as_deref(), Some("disk full"));
        assert_eq!(outcome.failed_batch(), Some(1));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_report_first_error_names_entity() {
        let report = SubmitReport {
            outcomes: vec![
                RecordOutcome {
                    entity: EntityKey::Occupant("Juan".to_string()),
                    result: RecordResult::Created,
                },
                RecordOutcome {
                    entity: EntityKey::Occupant("Maria".to_string()),
                    result: RecordResult::Failed {
                        message: "Upload failed.".to_string(),
                    },
                },
            ],
            gallery: None,
        };
        assert!(!report.is_success());
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(
            report.first_error().as_deref(),
            Some("Occupant: Maria\nUpload failed.")
        );

        match report.into_result() {
            Err(UploadError::SubmitPartialFailure {
                succeeded, failed, ..
            }) => {
                assert_eq!(succeeded, 1);
                assert_eq!(failed, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
