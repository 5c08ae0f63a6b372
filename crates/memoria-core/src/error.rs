//! Error types module
//!
//! `UploadError` is the single error type of the upload engine. Each variant describes
//! itself through [`ErrorMetadata`] so callers know what to show and how loudly to log.

use crate::constants::TRANSPORT_FAILURE_MESSAGE;
use crate::models::{LinkStatus, ReviewRejection};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like local constraint violations
    Debug,
    /// Warning level - for rejections and partial failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Whether the user can retry the same slot
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Whether internal details must be hidden from the user
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Local checks a file fails before it can reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{file}: {violation}")]
    LocalConstraintViolation {
        file: String,
        violation: ConstraintViolation,
    },

    #[error("{entity}: maximum {max} photos allowed ({requested} requested)")]
    CapacityExceeded {
        entity: String,
        max: usize,
        requested: usize,
    },

    #[error("{entity}\n{explanation}")]
    ValidationRejected { entity: String, explanation: String },

    #[error("Transport failure: {message}")]
    TransportFailure { message: String },

    #[error("Link invalid: {message}")]
    LinkInvalid { message: String },

    #[error("Link expired: {message}")]
    LinkExpired { message: String },

    #[error("Submit partially failed: {succeeded} succeeded, {failed} failed")]
    SubmitPartialFailure {
        succeeded: usize,
        failed: usize,
        first_error: Option<String>,
    },

    #[error("Document context has not been loaded")]
    ContextNotLoaded,

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("{0}: no photo is waiting to be cropped")]
    NoCropTarget(String),

    #[error("Missing {field} for: {}", .entities.join(", "))]
    MissingField {
        field: &'static str,
        entities: Vec<String>,
    },

    #[error("No changes to upload")]
    NothingToSubmit,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Review rejected: {}", .0.message())]
    ReviewRejected(ReviewRejection),
}

impl UploadError {
    /// Error that disables mutation for a non-valid link.
    pub fn read_only(status: LinkStatus, message: Option<&str>) -> Self {
        match status {
            LinkStatus::Expired => UploadError::LinkExpired {
                message: message.unwrap_or("This link has expired.").to_string(),
            },
            _ => UploadError::LinkInvalid {
                message: message.unwrap_or("Invalid or unavailable link.").to_string(),
            },
        }
    }

    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            UploadError::LocalConstraintViolation { .. } => "LocalConstraintViolation",
            UploadError::CapacityExceeded { .. } => "CapacityExceeded",
            UploadError::ValidationRejected { .. } => "ValidationRejected",
            UploadError::TransportFailure { .. } => "TransportFailure",
            UploadError::LinkInvalid { .. } => "LinkInvalid",
            UploadError::LinkExpired { .. } => "LinkExpired",
            UploadError::SubmitPartialFailure { .. } => "SubmitPartialFailure",
            UploadError::ContextNotLoaded => "ContextNotLoaded",
            UploadError::UnknownEntity(_) => "UnknownEntity",
            UploadError::NoCropTarget(_) => "NoCropTarget",
            UploadError::MissingField { .. } => "MissingField",
            UploadError::NothingToSubmit => "NothingToSubmit",
            UploadError::InvalidInput(_) => "InvalidInput",
            UploadError::ReviewRejected(_) => "ReviewRejected",
        }
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, sensitive, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (&'static str, bool, Option<&'static str>, bool, LogLevel) {
    match err {
        UploadError::LocalConstraintViolation { .. } => (
            "LOCAL_CONSTRAINT_VIOLATION",
            true,
            Some("Choose a JPG or PNG image under the size limit"),
            false,
            LogLevel::Debug,
        ),
        UploadError::CapacityExceeded { .. } => (
            "CAPACITY_EXCEEDED",
            true,
            Some("Remove some photos before adding more"),
            false,
            LogLevel::Debug,
        ),
        UploadError::ValidationRejected { .. } => (
            "VALIDATION_REJECTED",
            true,
            Some("Select a different photo"),
            false,
            LogLevel::Warn,
        ),
        UploadError::TransportFailure { .. } => (
            "TRANSPORT_FAILURE",
            true,
            Some("Check your connection and try again"),
            true,
            LogLevel::Error,
        ),
        UploadError::LinkInvalid { .. } => (
            "LINK_INVALID",
            false,
            Some("Verify the document link"),
            false,
            LogLevel::Debug,
        ),
        UploadError::LinkExpired { .. } => (
            "LINK_EXPIRED",
            false,
            Some("Request a new link"),
            false,
            LogLevel::Debug,
        ),
        UploadError::SubmitPartialFailure { .. } => (
            "SUBMIT_PARTIAL_FAILURE",
            true,
            Some("Submit again to send the remaining photos"),
            false,
            LogLevel::Warn,
        ),
        UploadError::ContextNotLoaded => (
            "CONTEXT_NOT_LOADED",
            true,
            Some("Load the document before uploading"),
            false,
            LogLevel::Debug,
        ),
        UploadError::UnknownEntity(_) => ("UNKNOWN_ENTITY", false, None, false, LogLevel::Debug),
        UploadError::NoCropTarget(_) => (
            "NO_CROP_TARGET",
            true,
            Some("Select a photo before confirming the crop"),
            false,
            LogLevel::Debug,
        ),
        UploadError::MissingField { .. } => (
            "MISSING_FIELD",
            true,
            Some("Fill in all required fields"),
            false,
            LogLevel::Debug,
        ),
        UploadError::NothingToSubmit => ("NOTHING_TO_SUBMIT", true, None, false, LogLevel::Debug),
        UploadError::InvalidInput(_) => (
            "INVALID_INPUT",
            true,
            Some("Check the input and try again"),
            false,
            LogLevel::Debug,
        ),
        UploadError::ReviewRejected(_) => ("REVIEW_REJECTED", false, None, false, LogLevel::Warn),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        upload_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::LocalConstraintViolation { file, violation } => match violation {
                ConstraintViolation::EmptyFile => format!("{}: file is empty.", file),
                ConstraintViolation::FileTooLarge { max, .. } => format!(
                    "{}: file too large. Max {}MB.",
                    file,
                    max / (1024 * 1024)
                ),
                ConstraintViolation::UnsupportedContentType { .. } => {
                    format!("{}: only JPG and PNG images are allowed.", file)
                }
            },
            UploadError::CapacityExceeded { max, .. } => {
                format!("Maximum {} photos allowed.", max)
            }
            UploadError::ValidationRejected {
                entity,
                explanation,
            } => format!("{}\n{}", entity, explanation),
            UploadError::TransportFailure { .. } => TRANSPORT_FAILURE_MESSAGE.to_string(),
            UploadError::LinkInvalid { message } => message.clone(),
            UploadError::LinkExpired { message } => message.clone(),
            UploadError::SubmitPartialFailure {
                succeeded,
                failed,
                first_error,
            } => match first_error {
                Some(e) => format!("{} succeeded, {} failed. {}", succeeded, failed, e),
                None => format!("{} succeeded, {} failed.", succeeded, failed),
            },
            UploadError::ContextNotLoaded => "Document is still loading.".to_string(),
            UploadError::UnknownEntity(name) => format!("Unknown record: {}", name),
            UploadError::NoCropTarget(_) => "Please crop the image before confirming.".to_string(),
            UploadError::MissingField { field, entities } => {
                format!("Please fill in {} for: {}", field, entities.join(", "))
            }
            UploadError::NothingToSubmit => "No changes to upload.".to_string(),
            UploadError::InvalidInput(msg) => msg.clone(),
            UploadError::ReviewRejected(rejection) => rejection.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_is_generic() {
        let err = UploadError::TransportFailure {
            message: "connection reset by peer at 10.0.0.3:443".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSPORT_FAILURE");
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("10.0.0.3"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_validation_rejected_is_attributable() {
        let err = UploadError::ValidationRejected {
            entity: "Occupant: Juan Dela Cruz".to_string(),
            explanation: "No face detected".to_string(),
        };
        assert_eq!(
            err.client_message(),
            "Occupant: Juan Dela Cruz\nNo face detected"
        );
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_read_only_maps_status() {
        assert_eq!(
            UploadError::read_only(LinkStatus::Expired, None).error_code(),
            "LINK_EXPIRED"
        );
        assert_eq!(
            UploadError::read_only(LinkStatus::Invalid, Some("gone")).client_message(),
            "gone"
        );
    }

    #[test]
    fn test_file_too_large_message() {
        let err = UploadError::LocalConstraintViolation {
            file: "big.jpg".to_string(),
            violation: ConstraintViolation::FileTooLarge {
                size: 11 * 1024 * 1024,
                max: 10 * 1024 * 1024,
            },
        };
        assert_eq!(err.client_message(), "big.jpg: file too large. Max 10MB.");
        assert_eq!(err.error_type(), "LocalConstraintViolation");
    }

    #[test]
    fn test_missing_field_lists_entities() {
        let err = UploadError::MissingField {
            field: "uploader name",
            entities: vec!["Juan".to_string(), "Maria".to_string()],
        };
        assert_eq!(err.to_string(), "Missing uploader name for: Juan, Maria");
    }
}
