//! Upload orchestrator
//!
//! Loads the document context, owns one [`Record`] per occupant (or a single gallery
//! record), and turns records into submission requests. After any dispatched submit the
//! context is reloaded and replaces local state wholesale.

use futures::future::join_all;
use memoria_core::constants::TRANSPORT_FAILURE_MESSAGE;
use memoria_core::models::{
    AssetId, BatchProgress, CreatePhotosRequest, DocumentContext, EntityKey, ExistingPhotoRow,
    LinkStatus, OccupantPhoto, PhotoFile, RecordOutcome, RecordResult, SlideshowBatchRequest,
    SubmitReport, UpdatePhotoRequest, Verdict,
};
use memoria_core::{ErrorMetadata, LinkLookup, RecordStore, StoreError, UploadConfig, UploadError};
use std::sync::Arc;
use tokio::sync::watch;

use crate::batch::BatchScheduler;
use crate::constraints::LocalConstraints;
use crate::gate::ValidationGate;
use crate::preview::{CropRegion, ImagePreprocessor};
use crate::record::{Record, RecordKind, SelectionReport};

const RECORD_FAILURE_MESSAGE: &str = "Upload failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// One portrait per occupant.
    Portraits,
    /// One slideshow gallery for the document.
    Slideshow,
}

pub struct UploadOrchestrator {
    store: Arc<dyn RecordStore>,
    gate: ValidationGate,
    constraints: LocalConstraints,
    preprocessor: ImagePreprocessor,
    scheduler: BatchScheduler,
    config: UploadConfig,
    mode: UploadMode,
    context: Option<Arc<DocumentContext>>,
    records: Vec<Record>,
}

impl UploadOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, config: UploadConfig, mode: UploadMode) -> Self {
        let constraints = LocalConstraints::from_config(&config);
        Self {
            gate: ValidationGate::new(store.clone(), constraints.clone()),
            preprocessor: ImagePreprocessor::new(config.preview_max_dimension),
            scheduler: BatchScheduler::new(config.slideshow_batch_size),
            constraints,
            store,
            config,
            mode,
            context: None,
            records: Vec::new(),
        }
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn context(&self) -> Option<&DocumentContext> {
        self.context.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, key: &EntityKey) -> Option<&Record> {
        self.records.iter().find(|r| r.key() == key)
    }

    /// Gallery progress as `(current, total)`.
    pub fn progress(&self) -> watch::Receiver<BatchProgress> {
        self.scheduler.subscribe()
    }

    fn link_lookup(&self) -> LinkLookup {
        match self.mode {
            UploadMode::Slideshow => LinkLookup::Slideshow,
            UploadMode::Portraits => self.config.link_lookup,
        }
    }

    /// Resolve the access link and stored photos for `document_no`.
    ///
    /// Never fails: an unusable link yields an `invalid` or `expired` context with no
    /// records. The previous context and records are replaced in full.
    pub async fn load_context(&mut self, document_no: &str) -> Arc<DocumentContext> {
        let document_no = document_no.trim();
        let context = if document_no.is_empty() {
            DocumentContext::unavailable(
                document_no,
                LinkStatus::Invalid,
                "Document number is missing.",
            )
        } else {
            match self.store.lookup_link(self.link_lookup(), document_no).await {
                Ok(rows) => DocumentContext::from_rows(document_no, &rows),
                Err(e) => link_failure_context(document_no, &e),
            }
        };

        let records = if context.is_valid() {
            self.load_records(&context).await
        } else {
            tracing::info!(
                document_no = %document_no,
                status = %context.link_status,
                "Link is not usable, records are read-only"
            );
            Vec::new()
        };

        tracing::info!(
            document_no = %document_no,
            status = %context.link_status,
            occupants = context.occupant_names.len(),
            records = records.len(),
            "Document context loaded"
        );

        let context = Arc::new(context);
        self.context = Some(context.clone());
        self.records = records;
        context
    }

    async fn load_records(&self, context: &DocumentContext) -> Vec<Record> {
        let document_no = context.document_no.as_str();
        match self.mode {
            UploadMode::Portraits => {
                let stored = match self.store.existing_photos(document_no).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!(
                            document_no = %document_no,
                            error = %e,
                            "Failed to load stored photos, assuming none"
                        );
                        Vec::new()
                    }
                };
                portrait_records(&context.occupant_names, &stored)
            }
            UploadMode::Slideshow => {
                let stored = match self.store.existing_slideshow(document_no).await {
                    Ok(row) => row,
                    Err(e) => {
                        tracing::warn!(
                            document_no = %document_no,
                            error = %e,
                            "Failed to load stored slideshow, assuming none"
                        );
                        None
                    }
                };
                vec![Record::gallery(
                    document_no,
                    stored,
                    self.config.slideshow_max_photos,
                )]
            }
        }
    }

    /// The loaded context, provided its link permits changes.
    fn ensure_mutable(&self) -> Result<Arc<DocumentContext>, UploadError> {
        let context = self.context.clone().ok_or(UploadError::ContextNotLoaded)?;
        if !context.is_valid() {
            return Err(UploadError::read_only(
                context.link_status,
                context.message.as_deref(),
            ));
        }
        Ok(context)
    }

    fn find_record<'a>(
        records: &'a mut [Record],
        key: &EntityKey,
    ) -> Result<&'a mut Record, UploadError> {
        records
            .iter_mut()
            .find(|r| r.key() == key)
            .ok_or_else(|| UploadError::UnknownEntity(key.to_string()))
    }

    fn record_mut(&mut self, key: &EntityKey) -> Result<&mut Record, UploadError> {
        self.ensure_mutable()?;
        Self::find_record(&mut self.records, key)
    }

    pub fn select_files(
        &mut self,
        key: &EntityKey,
        files: Vec<PhotoFile>,
    ) -> Result<SelectionReport, UploadError> {
        self.ensure_mutable()?;
        let record = Self::find_record(&mut self.records, key)?;
        let report = record.select_files(files, &self.constraints, &self.preprocessor)?;
        tracing::debug!(
            entity = %key,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "Files selected"
        );
        Ok(report)
    }

    /// Confirm the crop with bytes produced by an external crop widget.
    pub async fn confirm_crop(
        &mut self,
        key: &EntityKey,
        cropped: bytes::Bytes,
    ) -> Result<Verdict, UploadError> {
        self.ensure_mutable()?;
        let file = self.preprocessor.cropped_file(cropped);
        self.validate_crop(key, file).await
    }

    /// Confirm the crop by cutting `region` out of the selected photo. `None` keeps the
    /// whole frame.
    pub async fn confirm_crop_region(
        &mut self,
        key: &EntityKey,
        region: Option<CropRegion>,
    ) -> Result<Verdict, UploadError> {
        self.ensure_mutable()?;
        let source = Self::find_record(&mut self.records, key)?
            .crop_source()?
            .clone();
        let file = self.preprocessor.crop(&source, region)?;
        self.validate_crop(key, file).await
    }

    async fn validate_crop(
        &mut self,
        key: &EntityKey,
        file: PhotoFile,
    ) -> Result<Verdict, UploadError> {
        let record = Self::find_record(&mut self.records, key)?;
        let staged = record.stage_crop(file, &self.preprocessor)?;

        match self.gate.validate(&staged).await {
            Ok(verdict) if verdict.accepted => {
                record.finish_crop(&verdict)?;
                Ok(verdict)
            }
            Ok(verdict) => {
                record.finish_crop(&verdict)?;
                tracing::warn!(
                    entity = %key,
                    explanation = %verdict.explanation,
                    "Photo rejected"
                );
                Err(UploadError::ValidationRejected {
                    entity: key.to_string(),
                    explanation: verdict.explanation,
                })
            }
            Err(e) => {
                record.reject_crop(&e.client_message())?;
                Err(e)
            }
        }
    }

    pub fn cancel_crop(&mut self, key: &EntityKey) -> Result<(), UploadError> {
        self.record_mut(key)?.cancel_crop();
        Ok(())
    }

    /// Enter or leave replace mode. Returns whether the record is now editing.
    pub fn toggle_edit(&mut self, key: &EntityKey) -> Result<(), UploadError> {
        self.record_mut(key)?.toggle_edit()
    }

    pub fn cancel_edit(&mut self, key: &EntityKey) -> Result<(), UploadError> {
        self.record_mut(key)?.cancel_edit();
        Ok(())
    }

    pub fn remove_candidate(&mut self, key: &EntityKey, index: usize) -> Result<(), UploadError> {
        self.record_mut(key)?.remove_candidate(index).map(|_| ())
    }

    /// Queue a stored gallery photo, identified by URL, for deletion at submit.
    pub fn remove_existing(&mut self, key: &EntityKey, photo_url: &str) -> Result<(), UploadError> {
        let record = self.record_mut(key)?;
        let id = record
            .existing()
            .iter()
            .find(|a| a.remote_url() == Some(photo_url))
            .map(|a| a.id.clone())
            .ok_or_else(|| {
                UploadError::InvalidInput(format!("{}: no stored photo {}", key, photo_url))
            })?;
        record.remove_existing(&id)
    }

    pub fn set_uploader_name(
        &mut self,
        key: &EntityKey,
        name: impl Into<String>,
    ) -> Result<(), UploadError> {
        self.record_mut(key)?.set_uploader_name(name);
        Ok(())
    }

    pub fn set_gender(
        &mut self,
        key: &EntityKey,
        gender: impl Into<String>,
    ) -> Result<(), UploadError> {
        self.record_mut(key)?.set_gender(gender);
        Ok(())
    }

    pub fn set_email(&mut self, key: &EntityKey, email: Option<String>) -> Result<(), UploadError> {
        self.record_mut(key)?.set_email(email);
        Ok(())
    }

    /// Send every pending change.
    ///
    /// Fails without any network call when nothing is pending or a required field is
    /// missing. Once anything is dispatched the outcome is returned as a report (use
    /// [`SubmitReport::into_result`] to treat partial failure as an error) and the
    /// context is reloaded.
    pub async fn submit(&mut self) -> Result<SubmitReport, UploadError> {
        let context = self.ensure_mutable()?;
        let (report, carry) = match self.mode {
            UploadMode::Portraits => self.submit_portraits(&context).await?,
            UploadMode::Slideshow => self.submit_gallery(&context).await?,
        };

        if report.is_success() {
            tracing::info!(
                document_no = %context.document_no,
                records = report.succeeded_count(),
                "Submit completed"
            );
        } else {
            tracing::warn!(
                document_no = %context.document_no,
                succeeded = report.succeeded_count(),
                first_error = ?report.first_error(),
                "Submit partially failed"
            );
        }

        self.reload(&context.document_no, carry).await;
        Ok(report)
    }

    /// Reload the context, moving unsent work from `carry` onto the fresh records.
    async fn reload(&mut self, document_no: &str, carry: Vec<Record>) {
        self.load_context(document_no).await;
        for previous in carry {
            match Self::find_record(&mut self.records, previous.key()) {
                Ok(record) => record.adopt_unsent(previous),
                Err(_) => tracing::warn!(
                    entity = %previous.key(),
                    "Record disappeared on reload, unsent photos dropped"
                ),
            }
        }
    }

    async fn submit_portraits(
        &self,
        context: &DocumentContext,
    ) -> Result<(SubmitReport, Vec<Record>), UploadError> {
        let pending: Vec<&Record> = self.records.iter().filter(|r| r.has_changes()).collect();
        if pending.is_empty() {
            return Err(UploadError::NothingToSubmit);
        }

        let missing_uploader: Vec<String> = pending
            .iter()
            .filter(|r| r.uploader_name().trim().is_empty())
            .map(|r| r.key().to_string())
            .collect();
        if !missing_uploader.is_empty() {
            return Err(UploadError::MissingField {
                field: "uploader_name",
                entities: missing_uploader,
            });
        }

        let (updates, creates): (Vec<&Record>, Vec<&Record>) = pending
            .into_iter()
            .partition(|r| r.replace_target().is_some());

        let missing_gender: Vec<String> = creates
            .iter()
            .filter(|r| r.gender().trim().is_empty())
            .map(|r| r.key().to_string())
            .collect();
        if !missing_gender.is_empty() {
            return Err(UploadError::MissingField {
                field: "gender",
                entities: missing_gender,
            });
        }

        let create_request = (!creates.is_empty()).then(|| CreatePhotosRequest {
            document_no: context.document_no.clone(),
            occupants: creates
                .iter()
                .filter_map(|r| occupant_photo(context, r))
                .collect(),
        });
        let update_requests: Vec<(EntityKey, i64, UpdatePhotoRequest)> = updates
            .iter()
            .filter_map(|r| {
                let id = r.replace_target()?;
                let photo = first_submittable(r)?;
                Some((
                    r.key().clone(),
                    id,
                    UpdatePhotoRequest {
                        photo,
                        uploader_name: r.uploader_name().trim().to_string(),
                    },
                ))
            })
            .collect();
        let create_keys: Vec<EntityKey> = creates.iter().map(|r| r.key().clone()).collect();

        tracing::info!(
            document_no = %context.document_no,
            creates = create_keys.len(),
            updates = update_requests.len(),
            "Submitting portraits"
        );

        // The create request is polled first so it is dispatched ahead of the update group.
        let store = self.store.clone();
        let create = async {
            match &create_request {
                Some(request) => Some(store.create_photos(request).await),
                None => None,
            }
        };
        let update_group = join_all(
            update_requests
                .iter()
                .map(|(_, id, request)| store.update_photo(*id, request)),
        );
        let (create_result, update_results) = futures::join!(create, update_group);

        let mut outcomes = Vec::new();
        if let Some(result) = create_result {
            let result = match result {
                Ok(_) => RecordResult::Created,
                Err(e) => record_failure(&e),
            };
            outcomes.extend(create_keys.into_iter().map(|entity| RecordOutcome {
                entity,
                result: result.clone(),
            }));
        }
        for ((entity, id, _), result) in update_requests.into_iter().zip(update_results) {
            let result = match result {
                Ok(_) => RecordResult::Replaced,
                Err(e) => {
                    tracing::warn!(entity = %entity, photo_id = id, error = %e, "Replace failed");
                    record_failure(&e)
                }
            };
            outcomes.push(RecordOutcome { entity, result });
        }

        let carry = self
            .records
            .iter()
            .filter(|r| {
                outcomes.iter().any(|o| {
                    &o.entity == r.key() && matches!(o.result, RecordResult::Failed { .. })
                })
            })
            .cloned()
            .collect();

        Ok((
            SubmitReport {
                outcomes,
                gallery: None,
            },
            carry,
        ))
    }

    async fn submit_gallery(
        &mut self,
        context: &DocumentContext,
    ) -> Result<(SubmitReport, Vec<Record>), UploadError> {
        let store = self.store.clone();
        let record = self
            .records
            .iter_mut()
            .find(|r| r.kind() == RecordKind::Gallery)
            .ok_or_else(|| UploadError::UnknownEntity(context.document_no.clone()))?;

        let photos: Vec<PhotoFile> = record
            .submittable_candidates()
            .filter_map(|a| a.source.clone())
            .collect();
        if photos.is_empty() && record.pending_removals().is_empty() {
            return Err(UploadError::NothingToSubmit);
        }
        if !photos.is_empty() && record.uploader_name().trim().is_empty() {
            return Err(UploadError::MissingField {
                field: "uploader_name",
                entities: vec![record.key().to_string()],
            });
        }
        let requested = record.existing().len() + photos.len();
        if requested > record.max_assets() {
            return Err(UploadError::CapacityExceeded {
                entity: record.key().to_string(),
                max: record.max_assets(),
                requested,
            });
        }

        let entity = record.key().clone();
        let mut outcomes = Vec::new();

        let removals = record.take_pending_removals();
        if !removals.is_empty() {
            let mut deleted = 0;
            let mut first_failure = None;
            let mut remaining_urls = None;
            for asset in removals {
                let (id, url) = match (&asset.id, asset.remote_url()) {
                    (AssetId::Remote { id, .. }, Some(url)) => {
                        (*id, url.to_string())
                    }
                    _ => continue,
                };
                match store.delete_slideshow_photo(id, &url).await {
                    Ok(remaining) => {
                        deleted += 1;
                        remaining_urls = Some(remaining);
                    }
                    Err(e) => {
                        tracing::warn!(entity = %entity, photo_url = %url, error = %e, "Delete failed");
                        first_failure.get_or_insert_with(|| record_failure(&e));
                        record.requeue_removal(asset);
                    }
                }
            }
            if let Some(urls) = remaining_urls {
                record.replace_existing_urls(urls);
            }
            outcomes.push(RecordOutcome {
                entity: entity.clone(),
                result: first_failure.unwrap_or(RecordResult::Deleted { count: deleted }),
            });
        }

        // Failed deletions still occupy a slot on the backend.
        let occupied = record.existing().len() + record.pending_removals().len() + photos.len();
        let mut gallery = None;
        if !photos.is_empty() && occupied > record.max_assets() {
            let refusal = UploadError::CapacityExceeded {
                entity: entity.to_string(),
                max: record.max_assets(),
                requested: occupied,
            };
            tracing::warn!(entity = %entity, requested = occupied, "Slideshow upload skipped");
            outcomes.push(RecordOutcome {
                entity: entity.clone(),
                result: RecordResult::Failed {
                    message: refusal.client_message(),
                },
            });
        } else if !photos.is_empty() {
            let document_no = context.document_no.clone();
            let uploader_name = record.uploader_name().trim().to_string();
            let email_add = record.email().map(str::to_string);
            let batches = self.scheduler.schedule(&photos);

            tracing::info!(
                document_no = %document_no,
                photos = photos.len(),
                batches = batches.len(),
                "Submitting slideshow"
            );

            let outcome = self
                .scheduler
                .run_sequential(batches, |batch| {
                    let store = store.clone();
                    let request = SlideshowBatchRequest {
                        document_no: document_no.clone(),
                        uploader_name: uploader_name.clone(),
                        email_add: email_add.clone(),
                        photos: batch.assets,
                    };
                    async move { store.upload_slideshow_batch(&request).await.map(|_| ()) }
                })
                .await;

            record.drop_persisted(outcome.persisted_photos);
            outcomes.push(RecordOutcome {
                entity: entity.clone(),
                result: RecordResult::Uploaded {
                    persisted: outcome.persisted_photos,
                    unsent: outcome.unsent_photos,
                },
            });
            gallery = Some(outcome);
        }

        let carry = if record.has_changes() {
            vec![record.clone()]
        } else {
            Vec::new()
        };

        Ok((SubmitReport { outcomes, gallery }, carry))
    }
}

/// Map a failed link lookup. Only 403 means expired; everything else is invalid.
fn link_failure_context(document_no: &str, error: &StoreError) -> DocumentContext {
    match error.status() {
        Some(403) => {
            tracing::info!(document_no = %document_no, "Link has expired");
            DocumentContext::unavailable(document_no, LinkStatus::Expired, "This link has expired.")
        }
        Some(404) => DocumentContext::unavailable(
            document_no,
            LinkStatus::Invalid,
            error
                .server_message()
                .unwrap_or("Invalid or unavailable link."),
        ),
        _ => {
            tracing::error!(document_no = %document_no, error = %error, "Link lookup failed");
            DocumentContext::unavailable(
                document_no,
                LinkStatus::Invalid,
                "Invalid or unavailable link.",
            )
        }
    }
}

/// One record per distinct occupant name, in context order.
fn portrait_records(occupants: &[String], stored: &[ExistingPhotoRow]) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::with_capacity(occupants.len());
    for name in occupants {
        let key = EntityKey::Occupant(name.clone());
        if records.iter().any(|r| r.key() == &key) {
            tracing::warn!(occupant = %name, "Duplicate occupant name, keeping the first");
            continue;
        }
        let photo = stored.iter().find(|row| &row.occupant == name);
        records.push(Record::portrait(name, photo));
    }
    records
}

fn first_submittable(record: &Record) -> Option<PhotoFile> {
    record
        .submittable_candidates()
        .next()
        .and_then(|a| a.source.clone())
}

fn occupant_photo(context: &DocumentContext, record: &Record) -> Option<OccupantPhoto> {
    let EntityKey::Occupant(name) = record.key() else {
        return None;
    };
    Some(OccupantPhoto {
        index: context
            .occupant_names
            .iter()
            .position(|n| n == name)
            .unwrap_or_default(),
        occupant_name: name.clone(),
        gender: record.gender().trim().to_string(),
        uploader_name: record.uploader_name().trim().to_string(),
        photo: first_submittable(record)?,
    })
}

fn record_failure(error: &StoreError) -> RecordResult {
    let message = if error.is_transport() {
        TRANSPORT_FAILURE_MESSAGE.to_string()
    } else {
        error
            .server_message()
            .unwrap_or(RECORD_FAILURE_MESSAGE)
            .to_string()
    };
    RecordResult::Failed { message }
}
