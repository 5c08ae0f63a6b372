//! Upload orchestration engine
//!
//! - Local constraints and image pre-processing (constraints, preview)
//! - Remote validation gate (gate)
//! - Per-entity record state machine (record)
//! - Sequential batch scheduler (batch)
//! - Upload orchestrator and review submission (orchestrator, review)

pub mod batch;
pub mod constraints;
pub mod gate;
pub mod orchestrator;
pub mod preview;
pub mod record;
pub mod review;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::{schedule, Batch, BatchScheduler};
pub use constraints::{guess_content_type, LocalConstraints};
pub use gate::ValidationGate;
pub use orchestrator::{UploadMode, UploadOrchestrator};
pub use preview::{CropRegion, ImagePreprocessor};
pub use record::{Record, RecordKind, RecordState, SelectionReport};
pub use review::{ReviewDraft, ReviewSubmitter};
