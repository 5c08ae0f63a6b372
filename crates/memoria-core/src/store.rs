//! Record store abstraction
//!
//! The backend of record (interment lookup, photo persistence, validation, reviews) is an
//! external collaborator. The engine only talks to it through [`RecordStore`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LinkLookup;
use crate::models::{
    CreatePhotosRequest, ExistingPhotoRow, IntermentRow, PhotoFile, ReviewRequest,
    SlideshowBatchRequest, SlideshowRow, UpdatePhotoRequest, VerdictRow,
};

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend answered with a non-success status.
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        code: Option<String>,
    },

    /// No response (connection, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be understood.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the backend, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            StoreError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Decode(_))
    }
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Backend of record as seen by the upload engine.
///
/// Every method is one network round trip. Implementations must not retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Link / occupant lookup for a document.
    async fn lookup_link(
        &self,
        lookup: LinkLookup,
        document_no: &str,
    ) -> StoreResult<Vec<IntermentRow>>;

    /// Stored portraits of a document.
    async fn existing_photos(&self, document_no: &str) -> StoreResult<Vec<ExistingPhotoRow>>;

    /// Ask the remote validator about one photo.
    async fn validate_photo(&self, photo: &PhotoFile) -> StoreResult<VerdictRow>;

    /// Store portraits for occupants that have none yet.
    async fn create_photos(&self, request: &CreatePhotosRequest)
        -> StoreResult<serde_json::Value>;

    /// Replace one stored portrait.
    async fn update_photo(
        &self,
        id: i64,
        request: &UpdatePhotoRequest,
    ) -> StoreResult<serde_json::Value>;

    /// Stored slideshow of a document, `None` when there is none.
    async fn existing_slideshow(&self, document_no: &str) -> StoreResult<Option<SlideshowRow>>;

    /// Upload one batch of slideshow photos.
    async fn upload_slideshow_batch(
        &self,
        request: &SlideshowBatchRequest,
    ) -> StoreResult<serde_json::Value>;

    /// Remove one slideshow photo; returns the photos that remain.
    async fn delete_slideshow_photo(
        &self,
        slideshow_id: i64,
        photo_url: &str,
    ) -> StoreResult<Vec<String>>;

    /// Submit family feedback.
    async fn submit_review(&self, request: &ReviewRequest) -> StoreResult<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_accessors() {
        let err = StoreError::Status {
            status: 403,
            message: Some("Link expired".to_string()),
            code: None,
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.server_message(), Some("Link expired"));
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Request failed with status 403: Link expired");

        let err = StoreError::Transport("timed out".to_string());
        assert!(err.status().is_none());
        assert!(err.is_transport());
    }
}
