//! Asset model
//!
//! An [`Asset`] is an immutable description of one photo, either already stored by the
//! backend or selected locally. State changes produce a new value.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Logical entity that owns a set of photos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum EntityKey {
    /// Memorial portrait of one occupant, keyed by occupant name.
    Occupant(String),
    /// The slideshow gallery of a document, keyed by document number.
    Slideshow(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Occupant(name) => write!(f, "Occupant: {}", name),
            EntityKey::Slideshow(doc) => write!(f, "Slideshow {}", doc),
        }
    }
}

/// Raw photo bytes with the name and MIME type they were selected with.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl PhotoFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are elided; a multi-megabyte Debug dump helps nobody.
impl fmt::Debug for PhotoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    /// Temporary id of a locally selected photo.
    Local(Uuid),
    /// Id assigned by the backend. Slideshow photos share the slideshow id and are told
    /// apart by URL.
    Remote { id: i64, url: Option<String> },
}

impl AssetId {
    pub fn new_local() -> Self {
        AssetId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AssetId::Local(_))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Local(id) => write!(f, "local:{}", id),
            AssetId::Remote { id, url: None } => write!(f, "remote:{}", id),
            AssetId::Remote { id, url: Some(url) } => write!(f, "remote:{}:{}", id, url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOrigin {
    Existing,
    NewlySelected,
    Cropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// Never sent to the validator (existing photos, gallery photos).
    Unvalidated,
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Preview {
    #[default]
    None,
    /// Remote URL of a stored photo.
    Url(String),
    /// Inline thumbnail (`data:image/png;base64,...`).
    DataUrl(String),
}

impl Preview {
    pub fn is_none(&self) -> bool {
        matches!(self, Preview::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub owner: EntityKey,
    /// Local bytes. `None` for existing photos and for rejected candidates.
    pub source: Option<PhotoFile>,
    pub preview: Preview,
    pub origin: AssetOrigin,
    pub validation: ValidationState,
    pub rejection_reason: Option<String>,
}

impl Asset {
    pub fn selected(owner: EntityKey, file: PhotoFile, preview: Preview) -> Self {
        Self {
            id: AssetId::new_local(),
            owner,
            source: Some(file),
            preview,
            origin: AssetOrigin::NewlySelected,
            validation: ValidationState::Unvalidated,
            rejection_reason: None,
        }
    }

    pub fn existing(owner: EntityKey, id: i64, url: String, keyed_by_url: bool) -> Self {
        Self {
            id: AssetId::Remote {
                id,
                url: keyed_by_url.then(|| url.clone()),
            },
            owner,
            source: None,
            preview: Preview::Url(url),
            origin: AssetOrigin::Existing,
            validation: ValidationState::Unvalidated,
            rejection_reason: None,
        }
    }

    /// Replace the bytes with the output of the crop step.
    pub fn cropped(self, file: PhotoFile, preview: Preview) -> Self {
        Self {
            source: Some(file),
            preview,
            origin: AssetOrigin::Cropped,
            validation: ValidationState::Unvalidated,
            rejection_reason: None,
            ..self
        }
    }

    pub fn pending(self) -> Self {
        Self {
            validation: ValidationState::Pending,
            ..self
        }
    }

    pub fn accepted(self) -> Self {
        Self {
            validation: ValidationState::Accepted,
            rejection_reason: None,
            ..self
        }
    }

    /// Rejected assets drop their bytes and preview.
    pub fn rejected(self, reason: impl Into<String>) -> Self {
        Self {
            source: None,
            preview: Preview::None,
            validation: ValidationState::Rejected,
            rejection_reason: Some(reason.into()),
            ..self
        }
    }

    /// Whether this asset may be included in a submission payload.
    pub fn is_submittable(&self, requires_validation: bool) -> bool {
        if self.origin == AssetOrigin::Existing || self.source.is_none() {
            return false;
        }
        match self.validation {
            ValidationState::Accepted => true,
            ValidationState::Unvalidated => !requires_validation,
            ValidationState::Pending | ValidationState::Rejected => false,
        }
    }

    /// Backend URL of an existing photo.
    pub fn remote_url(&self) -> Option<&str> {
        match (&self.id, &self.preview) {
            (AssetId::Remote { url: Some(url), .. }, _) => Some(url),
            (AssetId::Remote { .. }, Preview::Url(url)) => Some(url),
            _ => None,
        }
    }
}
