//! Domain models
//!
//! Wire rows mirror the backend's JSON; everything else is the engine's own view of a
//! document and its photos.

pub mod asset;
pub mod context;
pub mod request;
pub mod review;
pub mod submission;
pub mod verdict;
pub mod wire;

pub use asset::{Asset, AssetId, AssetOrigin, EntityKey, PhotoFile, Preview, ValidationState};
pub use context::{DocumentContext, LinkStatus};
pub use request::{
    CreatePhotosRequest, OccupantPhoto, ReviewRequest, SlideshowBatchRequest, UpdatePhotoRequest,
};
pub use review::ReviewRejection;
pub use submission::{
    BatchOutcome, BatchProgress, BatchStatus, RecordOutcome, RecordResult, SubmissionOutcome,
    SubmitReport,
};
pub use verdict::Verdict;
pub use wire::{
    DeletePhotoResponse, ErrorBody, ExistingPhotoRow, IntermentRow, SlideshowRow, VerdictRow,
};
