//! Record state machine
//!
//! One [`Record`] per occupant portrait, or a single one for the slideshow gallery. A
//! record exclusively owns its existing and candidate assets. Every transition here is
//! synchronous; network work happens in the orchestrator between transitions.

use memoria_core::models::{
    Asset, AssetId, EntityKey, ExistingPhotoRow, PhotoFile, SlideshowRow, ValidationState,
    Verdict,
};
use memoria_core::constants::PORTRAIT_MAX_PHOTOS;
use memoria_core::UploadError;

use crate::constraints::LocalConstraints;
use crate::preview::ImagePreprocessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Single memorial portrait. Candidates must pass remote validation.
    Portrait,
    /// Slideshow gallery. Candidates are uploaded in batches without remote validation.
    Gallery,
}

/// Derived from the record's contents; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Idle,
    Selecting,
    Validating,
    ReadyToSubmit,
}

/// Result of one selection event. Files that fail local checks are reported individually.
#[derive(Debug, Default)]
pub struct SelectionReport {
    pub accepted: Vec<AssetId>,
    pub rejected: Vec<UploadError>,
}

#[derive(Debug, Clone)]
pub struct Record {
    key: EntityKey,
    kind: RecordKind,
    max_assets: usize,
    existing: Vec<Asset>,
    candidates: Vec<Asset>,
    /// Selected portrait waiting for the crop step.
    crop_target: Option<Asset>,
    editing: bool,
    /// Stored gallery photos queued for deletion at submit.
    pending_removals: Vec<Asset>,
    uploader_name: String,
    gender: String,
    email: Option<String>,
    /// Backend id of the slideshow row.
    gallery_id: Option<i64>,
}

impl Record {
    pub fn portrait(occupant_name: &str, stored: Option<&ExistingPhotoRow>) -> Self {
        let key = EntityKey::Occupant(occupant_name.to_string());
        let existing = stored
            .map(|row| vec![Asset::existing(key.clone(), row.id, row.photo.clone(), false)])
            .unwrap_or_default();
        Self::new(key, RecordKind::Portrait, PORTRAIT_MAX_PHOTOS, existing)
    }

    pub fn gallery(document_no: &str, stored: Option<SlideshowRow>, max_assets: usize) -> Self {
        let key = EntityKey::Slideshow(document_no.to_string());
        let Some(row) = stored else {
            return Self::new(key, RecordKind::Gallery, max_assets, Vec::new());
        };

        let id = row.id.unwrap_or_default();
        let existing = row
            .photo
            .into_iter()
            .map(|url| Asset::existing(key.clone(), id, url, true))
            .collect();
        let mut record = Self::new(key, RecordKind::Gallery, max_assets, existing);
        record.gallery_id = row.id;
        record.uploader_name = row.uploader_name.unwrap_or_default();
        record.email = row.email_add.filter(|e| !e.trim().is_empty());
        record
    }

    fn new(key: EntityKey, kind: RecordKind, max_assets: usize, existing: Vec<Asset>) -> Self {
        Self {
            key,
            kind,
            max_assets,
            existing,
            candidates: Vec::new(),
            crop_target: None,
            editing: false,
            pending_removals: Vec::new(),
            uploader_name: String::new(),
            gender: String::new(),
            email: None,
            gallery_id: None,
        }
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn max_assets(&self) -> usize {
        self.max_assets
    }

    pub fn existing(&self) -> &[Asset] {
        &self.existing
    }

    pub fn candidates(&self) -> &[Asset] {
        &self.candidates
    }

    pub fn crop_target(&self) -> Option<&Asset> {
        self.crop_target.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn pending_removals(&self) -> &[Asset] {
        &self.pending_removals
    }

    pub fn uploader_name(&self) -> &str {
        &self.uploader_name
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn gallery_id(&self) -> Option<i64> {
        self.gallery_id
    }

    pub fn set_uploader_name(&mut self, name: impl Into<String>) {
        self.uploader_name = name.into();
    }

    pub fn set_gender(&mut self, gender: impl Into<String>) {
        self.gender = gender.into();
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email.filter(|e| !e.trim().is_empty());
    }

    pub fn state(&self) -> RecordState {
        if let Some(target) = &self.crop_target {
            return if target.validation == ValidationState::Pending {
                RecordState::Validating
            } else {
                RecordState::Selecting
            };
        }
        if self.has_changes() {
            RecordState::ReadyToSubmit
        } else if !self.candidates.is_empty() {
            RecordState::Selecting
        } else {
            RecordState::Idle
        }
    }

    /// Whether a submit would send anything for this record.
    pub fn has_changes(&self) -> bool {
        !self.pending_removals.is_empty() || self.submittable_candidates().next().is_some()
    }

    /// Slots taken by stored photos. A portrait in replace mode frees its slot.
    fn occupied(&self) -> usize {
        let existing = if self.editing { 0 } else { self.existing.len() };
        existing + self.candidates.len() + usize::from(self.crop_target.is_some())
    }

    /// Admit a selection event.
    ///
    /// The whole event is refused with [`UploadError::CapacityExceeded`] when it would
    /// push the record over its cap; nothing changes in that case. Otherwise each file is
    /// checked locally and dropped on its own if it fails. A portrait file becomes the crop
    /// target; gallery files become candidates in selection order.
    pub fn select_files(
        &mut self,
        files: Vec<PhotoFile>,
        constraints: &LocalConstraints,
        preprocessor: &ImagePreprocessor,
    ) -> Result<SelectionReport, UploadError> {
        let requested = self.occupied() + files.len();
        if requested > self.max_assets {
            tracing::debug!(
                entity = %self.key,
                max = self.max_assets,
                requested,
                "Selection exceeds record capacity"
            );
            return Err(UploadError::CapacityExceeded {
                entity: self.key.to_string(),
                max: self.max_assets,
                requested,
            });
        }

        let mut report = SelectionReport::default();
        for file in files {
            if let Err(e) = constraints.check(&file) {
                report.rejected.push(e);
                continue;
            }

            let preview = preprocessor.preview(&file);
            let asset = Asset::selected(self.key.clone(), file, preview);
            report.accepted.push(asset.id.clone());
            match self.kind {
                RecordKind::Portrait => self.crop_target = Some(asset),
                RecordKind::Gallery => self.candidates.push(asset),
            }
        }
        Ok(report)
    }

    /// Source bytes of the crop target.
    pub fn crop_source(&self) -> Result<&PhotoFile, UploadError> {
        self.crop_target
            .as_ref()
            .and_then(|a| a.source.as_ref())
            .ok_or_else(|| UploadError::NoCropTarget(self.key.to_string()))
    }

    /// Replace the crop target's bytes with the cropped output and mark it pending.
    /// Returns the file to send to the validator.
    pub fn stage_crop(
        &mut self,
        file: PhotoFile,
        preprocessor: &ImagePreprocessor,
    ) -> Result<PhotoFile, UploadError> {
        let target = self
            .crop_target
            .take()
            .ok_or_else(|| UploadError::NoCropTarget(self.key.to_string()))?;
        let preview = preprocessor.preview(&file);
        self.crop_target = Some(target.cropped(file.clone(), preview).pending());
        Ok(file)
    }

    /// Apply the validator's verdict to the staged crop target and close the crop step.
    ///
    /// An accepted photo becomes the record's candidate. A rejected one is returned
    /// stripped of its bytes and preview and never enters the candidate set.
    pub fn finish_crop(&mut self, verdict: &Verdict) -> Result<Asset, UploadError> {
        if !verdict.accepted {
            return self.reject_crop(&verdict.explanation);
        }

        let target = self
            .crop_target
            .take()
            .ok_or_else(|| UploadError::NoCropTarget(self.key.to_string()))?;
        let accepted = target.accepted();
        self.candidates.clear();
        self.candidates.push(accepted.clone());
        Ok(accepted)
    }

    /// Discard the staged crop target as failed validation.
    pub fn reject_crop(&mut self, reason: &str) -> Result<Asset, UploadError> {
        let target = self
            .crop_target
            .take()
            .ok_or_else(|| UploadError::NoCropTarget(self.key.to_string()))?;
        Ok(target.rejected(reason))
    }

    pub fn cancel_crop(&mut self) -> Option<Asset> {
        self.crop_target.take()
    }

    /// Mark the stored portrait for replacement. Entering the mode discards any candidate;
    /// repeating it changes nothing. [`Record::cancel_edit`] leaves the mode.
    pub fn toggle_edit(&mut self) -> Result<(), UploadError> {
        if self.kind != RecordKind::Portrait || self.existing.is_empty() {
            return Err(UploadError::InvalidInput(format!(
                "{}: no stored photo to replace",
                self.key
            )));
        }
        if !self.editing {
            self.editing = true;
            self.candidates.clear();
            self.crop_target = None;
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = false;
        self.candidates.clear();
        self.crop_target = None;
    }

    pub fn remove_candidate(&mut self, index: usize) -> Result<Asset, UploadError> {
        if index >= self.candidates.len() {
            return Err(UploadError::InvalidInput(format!(
                "{}: no candidate at position {}",
                self.key, index
            )));
        }
        Ok(self.candidates.remove(index))
    }

    /// Queue a stored gallery photo for deletion. Nothing is sent until submit.
    pub fn remove_existing(&mut self, id: &AssetId) -> Result<(), UploadError> {
        if self.kind != RecordKind::Gallery {
            return Err(UploadError::InvalidInput(format!(
                "{}: stored portraits can only be replaced",
                self.key
            )));
        }
        if self.gallery_id.is_none() {
            return Err(UploadError::InvalidInput(format!(
                "{}: slideshow has no stored id, nothing to delete",
                self.key
            )));
        }
        let position = self
            .existing
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| UploadError::InvalidInput(format!("{}: unknown photo {}", self.key, id)))?;
        let asset = self.existing.remove(position);
        self.pending_removals.push(asset);
        Ok(())
    }

    /// Assets eligible for the next submission payload, in selection order.
    pub fn submittable_candidates(&self) -> impl Iterator<Item = &Asset> {
        let requires_validation = self.kind == RecordKind::Portrait;
        self.candidates
            .iter()
            .filter(move |a| a.is_submittable(requires_validation))
    }

    /// The stored portrait this record would replace.
    pub fn replace_target(&self) -> Option<i64> {
        if !self.editing {
            return None;
        }
        self.existing.first().and_then(|a| match a.id {
            AssetId::Remote { id, .. } => Some(id),
            AssetId::Local(_) => None,
        })
    }

    /// Drop the first `count` candidates once they are durably stored.
    pub fn drop_persisted(&mut self, count: usize) {
        let count = count.min(self.candidates.len());
        self.candidates.drain(..count);
    }

    /// Take the queued deletions, leaving none.
    pub fn take_pending_removals(&mut self) -> Vec<Asset> {
        std::mem::take(&mut self.pending_removals)
    }

    /// Replace the stored gallery with the list the backend returned after a delete.
    /// Photos still queued for removal stay out of the stored set.
    pub fn replace_existing_urls(&mut self, urls: Vec<String>) {
        let Some(id) = self.gallery_id else {
            return;
        };
        let queued: Vec<&str> = self
            .pending_removals
            .iter()
            .filter_map(|a| a.remote_url())
            .collect();
        let existing = urls
            .into_iter()
            .filter(|url| !queued.contains(&url.as_str()))
            .map(|url| Asset::existing(self.key.clone(), id, url, true))
            .collect();
        self.existing = existing;
    }

    /// Re-queue a removal whose delete call failed.
    pub fn requeue_removal(&mut self, asset: Asset) {
        self.pending_removals.push(asset);
    }

    /// Carry unsent work from the record this one replaces after a reload.
    ///
    /// Candidates move across as they are. Form fields are kept only where the freshly
    /// loaded record has none. Removals still pointing at a stored photo are queued again.
    pub fn adopt_unsent(&mut self, previous: Record) {
        let Record {
            candidates,
            pending_removals,
            uploader_name,
            gender,
            email,
            editing,
            ..
        } = previous;

        if self.uploader_name.trim().is_empty() {
            self.uploader_name = uploader_name;
        }
        if self.gender.trim().is_empty() {
            self.gender = gender;
        }
        if self.email.is_none() {
            self.email = email;
        }

        for removal in pending_removals {
            let url = removal.remote_url().map(str::to_string);
            if let Some(position) = self
                .existing
                .iter()
                .position(|a| a.remote_url().map(str::to_string) == url)
            {
                let asset = self.existing.remove(position);
                self.pending_removals.push(asset);
            }
        }

        self.editing = editing && !self.existing.is_empty();
        let stored = if self.editing { 0 } else { self.existing.len() };
        let room = self.max_assets.saturating_sub(stored);
        self.candidates = candidates.into_iter().take(room).collect();
    }
}
