//! JSON rows exchanged with the backend of record.

use serde::{Deserialize, Serialize};

/// One row of `GET /interments/{documentNo}` (and the review-link / slideshow variants).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermentRow {
    #[serde(default)]
    pub name1: String,
    #[serde(default)]
    pub documentno: String,
    #[serde(default)]
    pub date_interment: Option<String>,
    /// Present on multi-occupant links; legacy links only carry `name1`.
    #[serde(default)]
    pub occupant: Option<String>,
}

impl IntermentRow {
    pub fn occupant_name(&self) -> &str {
        self.occupant.as_deref().unwrap_or(&self.name1)
    }
}

/// One row of `GET /upload-photos/by-document/{documentNo}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingPhotoRow {
    pub id: i64,
    pub occupant: String,
    /// Public URL of the stored portrait.
    pub photo: String,
}

/// Verdict payload of `POST /upload-photos/validate-photo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRow {
    #[serde(default)]
    pub is_valid: Option<bool>,
    #[serde(default)]
    pub output: Option<String>,
}

/// The validator answers with either a single verdict or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VerdictResponse {
    // Arrays first: every row field has a default, so `[]` would also match a row.
    Many(Vec<VerdictRow>),
    One(VerdictRow),
}

impl VerdictResponse {
    /// The verdict that counts: the object itself, or the first array element.
    pub fn into_first(self) -> Option<VerdictRow> {
        match self {
            VerdictResponse::One(row) => Some(row),
            VerdictResponse::Many(rows) => rows.into_iter().next(),
        }
    }
}

/// Stored slideshow for a document (`GET /slideshow/{documentNo}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideshowRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub photo: Vec<String>,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub email_add: Option<String>,
}

/// Response of `DELETE /slideshow/photo/{id}`: the photos that remain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePhotoResponse {
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Error payload returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
