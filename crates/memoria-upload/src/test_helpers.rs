//! In-memory record store for engine tests
//!
//! Records every call in dispatch order and answers from scripted state.

use async_trait::async_trait;
use memoria_core::models::{
    CreatePhotosRequest, ExistingPhotoRow, IntermentRow, PhotoFile, ReviewRequest,
    SlideshowBatchRequest, SlideshowRow, UpdatePhotoRequest, VerdictRow,
};
use memoria_core::{LinkLookup, RecordStore, StoreError, StoreResult};
use serde_json::{json, Value as JsonValue};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LookupLink(LinkLookup, String),
    ExistingPhotos(String),
    Validate(String),
    Create {
        fields: Vec<(String, String)>,
        files: Vec<String>,
    },
    Update {
        id: i64,
        uploader_name: String,
    },
    ExistingSlideshow(String),
    SlideshowBatch {
        uploader_name: String,
        email_add: Option<String>,
        files: Vec<String>,
    },
    DeleteSlideshowPhoto {
        id: i64,
        photo_url: String,
    },
    SubmitReview(Vec<(String, String)>),
}

struct MockState {
    calls: Vec<StoreCall>,
    link: StoreResult<Vec<IntermentRow>>,
    existing_photos: StoreResult<Vec<ExistingPhotoRow>>,
    verdicts: VecDeque<VerdictRow>,
    validation_error: Option<StoreError>,
    slideshow: Option<SlideshowRow>,
    batches_seen: usize,
    failing_batch: Option<usize>,
    failing_updates: HashSet<i64>,
    create_error: Option<StoreError>,
    delete_error: Option<StoreError>,
    review_error: Option<StoreError>,
    next_photo_id: i64,
}

pub struct MockRecordStore {
    state: Mutex<MockState>,
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                calls: Vec::new(),
                link: Ok(Vec::new()),
                existing_photos: Ok(Vec::new()),
                verdicts: VecDeque::new(),
                validation_error: None,
                slideshow: None,
                batches_seen: 0,
                failing_batch: None,
                failing_updates: HashSet::new(),
                create_error: None,
                delete_error: None,
                review_error: None,
                next_photo_id: 100,
            }),
        }
    }

    /// Store with a valid link for `document_no` listing `occupants`.
    pub fn with_occupants(document_no: &str, occupants: &[&str]) -> Self {
        let store = Self::new();
        store.set_link(Ok(occupants
            .iter()
            .map(|name| IntermentRow {
                name1: occupants.first().map(|s| s.to_string()).unwrap_or_default(),
                documentno: document_no.to_string(),
                date_interment: Some("2024-03-04".to_string()),
                occupant: Some(name.to_string()),
            })
            .collect()));
        store
    }

    pub fn set_link(&self, result: StoreResult<Vec<IntermentRow>>) {
        self.state.lock().unwrap().link = result;
    }

    pub fn set_existing_photos(&self, result: StoreResult<Vec<ExistingPhotoRow>>) {
        self.state.lock().unwrap().existing_photos = result;
    }

    pub fn set_slideshow(&self, row: Option<SlideshowRow>) {
        self.state.lock().unwrap().slideshow = row;
    }

    pub fn push_verdict(&self, row: VerdictRow) {
        self.state.lock().unwrap().verdicts.push_back(row);
    }

    pub fn fail_validation(&self, error: StoreError) {
        self.state.lock().unwrap().validation_error = Some(error);
    }

    /// Fail the gallery batch with this zero-based index.
    pub fn fail_batch(&self, index: usize) {
        self.state.lock().unwrap().failing_batch = Some(index);
    }

    pub fn fail_update(&self, id: i64) {
        self.state.lock().unwrap().failing_updates.insert(id);
    }

    pub fn fail_create(&self, error: StoreError) {
        self.state.lock().unwrap().create_error = Some(error);
    }

    pub fn fail_delete(&self, error: StoreError) {
        self.state.lock().unwrap().delete_error = Some(error);
    }

    pub fn fail_review(&self, error: StoreError) {
        self.state.lock().unwrap().review_error = Some(error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn slideshow(&self) -> Option<SlideshowRow> {
        self.state.lock().unwrap().slideshow.clone()
    }

    fn record(&self, call: StoreCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

pub fn server_error(status: u16, message: &str) -> StoreError {
    StoreError::Status {
        status,
        message: Some(message.to_string()),
        code: None,
    }
}

pub fn jpeg(name: &str) -> PhotoFile {
    PhotoFile::new(name, "image/jpeg", vec![0xFFu8; 1024])
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn lookup_link(
        &self,
        lookup: LinkLookup,
        document_no: &str,
    ) -> StoreResult<Vec<IntermentRow>> {
        self.record(StoreCall::LookupLink(lookup, document_no.to_string()));
        self.state.lock().unwrap().link.clone()
    }

    async fn existing_photos(&self, document_no: &str) -> StoreResult<Vec<ExistingPhotoRow>> {
        self.record(StoreCall::ExistingPhotos(document_no.to_string()));
        self.state.lock().unwrap().existing_photos.clone()
    }

    async fn validate_photo(&self, photo: &PhotoFile) -> StoreResult<VerdictRow> {
        self.record(StoreCall::Validate(photo.filename.clone()));
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.validation_error {
            return Err(e.clone());
        }
        Ok(state.verdicts.pop_front().unwrap_or(VerdictRow {
            is_valid: Some(true),
            output: Some("clear face, acceptable".to_string()),
        }))
    }

    async fn create_photos(&self, request: &CreatePhotosRequest) -> StoreResult<JsonValue> {
        self.record(StoreCall::Create {
            fields: request.text_fields(),
            files: request
                .file_fields()
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.create_error {
            return Err(e.clone());
        }
        let mut created = Vec::new();
        for occupant in &request.occupants {
            state.next_photo_id += 1;
            let row = ExistingPhotoRow {
                id: state.next_photo_id,
                occupant: occupant.occupant_name.clone(),
                photo: format!("https://cdn.example/{}.png", state.next_photo_id),
            };
            created.push(json!({ "id": row.id, "occupant": row.occupant }));
            if let Ok(rows) = &mut state.existing_photos {
                rows.push(row);
            }
        }
        Ok(JsonValue::Array(created))
    }

    async fn update_photo(&self, id: i64, request: &UpdatePhotoRequest) -> StoreResult<JsonValue> {
        self.record(StoreCall::Update {
            id,
            uploader_name: request.uploader_name.clone(),
        });
        if self.state.lock().unwrap().failing_updates.contains(&id) {
            return Err(server_error(500, "Could not replace photo"));
        }
        Ok(json!({ "id": id }))
    }

    async fn existing_slideshow(&self, document_no: &str) -> StoreResult<Option<SlideshowRow>> {
        self.record(StoreCall::ExistingSlideshow(document_no.to_string()));
        Ok(self.state.lock().unwrap().slideshow.clone())
    }

    async fn upload_slideshow_batch(
        &self,
        request: &SlideshowBatchRequest,
    ) -> StoreResult<JsonValue> {
        let files: Vec<String> = request.photos.iter().map(|p| p.filename.clone()).collect();
        self.record(StoreCall::SlideshowBatch {
            uploader_name: request.uploader_name.clone(),
            email_add: request.email_add.clone(),
            files: files.clone(),
        });

        let mut state = self.state.lock().unwrap();
        let index = state.batches_seen;
        state.batches_seen += 1;
        if state.failing_batch == Some(index) {
            return Err(server_error(500, "Batch rejected"));
        }

        let row = state.slideshow.get_or_insert_with(|| SlideshowRow {
            id: Some(9),
            ..Default::default()
        });
        row.uploader_name = Some(request.uploader_name.clone());
        row.email_add = request.email_add.clone();
        row.photo
            .extend(files.iter().map(|f| format!("https://cdn.example/slides/{}", f)));
        Ok(json!({ "photo": row.photo }))
    }

    async fn delete_slideshow_photo(&self, id: i64, photo_url: &str) -> StoreResult<Vec<String>> {
        self.record(StoreCall::DeleteSlideshowPhoto {
            id,
            photo_url: photo_url.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.delete_error {
            return Err(e.clone());
        }
        let row = state
            .slideshow
            .as_mut()
            .ok_or_else(|| server_error(404, "Slideshow not found"))?;
        row.photo.retain(|p| p != photo_url);
        Ok(row.photo.clone())
    }

    async fn submit_review(&self, request: &ReviewRequest) -> StoreResult<JsonValue> {
        self.record(StoreCall::SubmitReview(request.text_fields()));
        if let Some(e) = &self.state.lock().unwrap().review_error {
            return Err(e.clone());
        }
        Ok(json!({ "success": true }))
    }
}
