//! Shared constants and defaults.

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

pub const MAX_FILE_SIZE_MB: usize = 10;
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Photos per slideshow request. Bounds the multipart payload size.
pub const SLIDESHOW_BATCH_SIZE: usize = 5;
pub const SLIDESHOW_MAX_PHOTOS: usize = 50;
/// A memorial portrait record holds exactly one photo.
pub const PORTRAIT_MAX_PHOTOS: usize = 1;

pub const PREVIEW_MAX_DIMENSION: u32 = 320;

pub const CROPPED_FILENAME: &str = "cropped.png";
pub const CROPPED_CONTENT_TYPE: &str = "image/png";

/// Explanation used when the validator answers without one.
pub const VALIDATION_FALLBACK_EXPLANATION: &str = "Photo validation failed.";
/// Client-facing text for every transport failure.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Unable to reach the server. Please try again.";
