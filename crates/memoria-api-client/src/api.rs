//! [`RecordStore`] implementation over HTTP.
//!
//! Routes match the backend of record: `/interments`, `/upload-photos`, `/slideshow`,
//! `/review`.

use async_trait::async_trait;
use memoria_core::models::wire::VerdictResponse;
use memoria_core::models::{
    CreatePhotosRequest, DeletePhotoResponse, ExistingPhotoRow, IntermentRow, PhotoFile,
    ReviewRequest, SlideshowBatchRequest, SlideshowRow, UpdatePhotoRequest, VerdictRow,
};
use memoria_core::{LinkLookup, RecordStore, StoreError, StoreResult};
use reqwest::multipart::Form;

use crate::{file_part, segment, text_form, ApiClient};

#[async_trait]
impl RecordStore for ApiClient {
    async fn lookup_link(
        &self,
        lookup: LinkLookup,
        document_no: &str,
    ) -> StoreResult<Vec<IntermentRow>> {
        let path = format!("{}/{}", lookup.path_prefix(), segment(document_no));
        // A null body counts as an empty result.
        let rows: Option<Vec<IntermentRow>> = self.get(&path).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn existing_photos(&self, document_no: &str) -> StoreResult<Vec<ExistingPhotoRow>> {
        let path = format!("/upload-photos/by-document/{}", segment(document_no));
        let rows: Option<Vec<ExistingPhotoRow>> = self.get(&path).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn validate_photo(&self, photo: &PhotoFile) -> StoreResult<VerdictRow> {
        let form = Form::new().part("photo", file_part(photo));
        let response: VerdictResponse = self
            .post_multipart("/upload-photos/validate-photo", form)
            .await?;
        Ok(response.into_first().unwrap_or_default())
    }

    async fn create_photos(
        &self,
        request: &CreatePhotosRequest,
    ) -> StoreResult<serde_json::Value> {
        let form = request
            .file_fields()
            .into_iter()
            .fold(text_form(request.text_fields()), |form, (name, file)| {
                form.part(name, file_part(file))
            });
        self.post_multipart("/upload-photos", form).await
    }

    async fn update_photo(
        &self,
        id: i64,
        request: &UpdatePhotoRequest,
    ) -> StoreResult<serde_json::Value> {
        let form = Form::new()
            .part("photo", file_part(&request.photo))
            .text("uploader_name", request.uploader_name.clone());
        self.post_multipart(&format!("/upload-photos/{}", id), form)
            .await
    }

    async fn existing_slideshow(&self, document_no: &str) -> StoreResult<Option<SlideshowRow>> {
        let path = format!("/slideshow/{}", segment(document_no));
        match self.get::<Option<SlideshowRow>>(&path).await {
            Ok(row) => Ok(row),
            Err(StoreError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn upload_slideshow_batch(
        &self,
        request: &SlideshowBatchRequest,
    ) -> StoreResult<serde_json::Value> {
        let form = request
            .photos
            .iter()
            .fold(text_form(request.text_fields()), |form, photo| {
                form.part("photo[]", file_part(photo))
            });
        self.post_multipart("/slideshow", form).await
    }

    async fn delete_slideshow_photo(
        &self,
        slideshow_id: i64,
        photo_url: &str,
    ) -> StoreResult<Vec<String>> {
        let body = serde_json::json!({ "photo_url": photo_url });
        let response: DeletePhotoResponse = self
            .delete_json(&format!("/slideshow/photo/{}", slideshow_id), &body)
            .await?;
        Ok(response.photos)
    }

    async fn submit_review(&self, request: &ReviewRequest) -> StoreResult<serde_json::Value> {
        let form = request
            .file_fields()
            .into_iter()
            .fold(text_form(request.text_fields()), |form, (name, file)| {
                form.part(name, file_part(file))
            });
        self.post_multipart("/review", form).await
    }
}
