//! Review submission
//!
//! Family feedback bound to a document link, with optional social-media screenshots.

use memoria_core::constants::TRANSPORT_FAILURE_MESSAGE;
use memoria_core::models::{DocumentContext, PhotoFile, ReviewRejection, ReviewRequest};
use memoria_core::{RecordStore, StoreError, UploadError};
use std::sync::Arc;

use crate::constraints::LocalConstraints;

/// Feedback as entered by the reviewer.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    pub reviewer_name: String,
    pub contact_number: String,
    pub selected_public_question: String,
    pub selected_private_question: String,
    pub public_others: Vec<String>,
    pub private_faq_answer: String,
    pub private_others: String,
    pub fb_screenshot: Option<PhotoFile>,
    pub google_screenshot: Option<PhotoFile>,
}

pub struct ReviewSubmitter {
    store: Arc<dyn RecordStore>,
    constraints: LocalConstraints,
}

impl ReviewSubmitter {
    pub fn new(store: Arc<dyn RecordStore>, constraints: LocalConstraints) -> Self {
        Self { store, constraints }
    }

    /// Check the draft locally, then send it. Backend refusals come back as
    /// [`UploadError::ReviewRejected`].
    pub async fn submit(
        &self,
        context: &DocumentContext,
        draft: ReviewDraft,
    ) -> Result<serde_json::Value, UploadError> {
        if !context.is_valid() {
            return Err(UploadError::read_only(
                context.link_status,
                context.message.as_deref(),
            ));
        }

        let request = self.build_request(context, draft)?;

        match self.store.submit_review(&request).await {
            Ok(body) => {
                tracing::info!(document_no = %context.document_no, "Review submitted");
                Ok(body)
            }
            Err(StoreError::Status { status, message, code }) => {
                let rejection = ReviewRejection::from_code(code.as_deref(), message.as_deref());
                tracing::warn!(
                    document_no = %context.document_no,
                    status,
                    code = ?code,
                    "Review rejected"
                );
                Err(UploadError::ReviewRejected(rejection))
            }
            Err(e) => {
                tracing::error!(
                    document_no = %context.document_no,
                    error = %e,
                    "Review submission failed"
                );
                Err(UploadError::TransportFailure {
                    message: TRANSPORT_FAILURE_MESSAGE.to_string(),
                })
            }
        }
    }

    fn build_request(
        &self,
        context: &DocumentContext,
        draft: ReviewDraft,
    ) -> Result<ReviewRequest, UploadError> {
        let required = [
            ("reviewer_name", &draft.reviewer_name),
            ("contact_number", &draft.contact_number),
            ("selected_public_question", &draft.selected_public_question),
            ("selected_private_question", &draft.selected_private_question),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(UploadError::MissingField {
                field: *field,
                entities: vec![context.document_no.clone()],
            });
        }

        if draft.fb_screenshot.is_none() && draft.google_screenshot.is_none() {
            return Err(UploadError::ReviewRejected(
                ReviewRejection::ScreenshotRequired,
            ));
        }
        for screenshot in [&draft.fb_screenshot, &draft.google_screenshot]
            .into_iter()
            .flatten()
        {
            self.constraints.check(screenshot)?;
        }

        Ok(ReviewRequest {
            document_no: context.document_no.clone(),
            reviewer_name: draft.reviewer_name.trim().to_string(),
            contact_number: draft.contact_number.trim().to_string(),
            selected_public_question: draft.selected_public_question,
            selected_private_question: draft.selected_private_question,
            public_others: draft
                .public_others
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            private_faq_answer: draft.private_faq_answer,
            private_others: draft.private_others,
            fb_screenshot: draft.fb_screenshot,
            google_screenshot: draft.google_screenshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg, MockRecordStore, StoreCall};
    use memoria_core::models::LinkStatus;
    use memoria_core::UploadConfig;

    fn context() -> DocumentContext {
        DocumentContext {
            document_no: "12345".to_string(),
            occupant_names: vec!["Juan Dela Cruz".to_string()],
            interment_date: "March 4, 2024".to_string(),
            link_status: LinkStatus::Valid,
            message: None,
        }
    }

    fn draft() -> ReviewDraft {
        ReviewDraft {
            reviewer_name: "Maria".to_string(),
            contact_number: "09171234567".to_string(),
            selected_public_question: "How was the service?".to_string(),
            selected_private_question: "Any suggestions?".to_string(),
            public_others: vec!["Clean grounds".to_string(), " ".to_string()],
            private_faq_answer: "Friendly staff".to_string(),
            private_others: String::new(),
            fb_screenshot: Some(jpeg("fb.jpg")),
            google_screenshot: None,
        }
    }

    fn submitter(store: &Arc<MockRecordStore>) -> ReviewSubmitter {
        ReviewSubmitter::new(
            store.clone(),
            LocalConstraints::from_config(&UploadConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_submit_review_sends_fields() {
        let store = Arc::new(MockRecordStore::new());

        submitter(&store).submit(&context(), draft()).await.unwrap();

        let calls = store.calls();
        let StoreCall::SubmitReview(fields) = &calls[0] else {
            panic!("expected review call, got {calls:?}");
        };
        assert!(fields.contains(&("document_no".to_string(), "12345".to_string())));
        assert!(fields.contains(&("public_others".to_string(), "Clean grounds".to_string())));
    }

    #[tokio::test]
    async fn test_screenshot_required_locally() {
        let store = Arc::new(MockRecordStore::new());
        let mut d = draft();
        d.fb_screenshot = None;

        let result = submitter(&store).submit(&context(), d).await;

        assert_eq!(
            result,
            Err(UploadError::ReviewRejected(ReviewRejection::ScreenshotRequired))
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_contact_number() {
        let store = Arc::new(MockRecordStore::new());
        let mut d = draft();
        d.contact_number = "  ".to_string();

        let result = submitter(&store).submit(&context(), d).await;

        assert!(matches!(
            result,
            Err(UploadError::MissingField {
                field: "contact_number",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_backend_code_maps_to_rejection() {
        let store = Arc::new(MockRecordStore::new());
        store.fail_review(StoreError::Status {
            status: 422,
            message: Some("dup".to_string()),
            code: Some("DUPLICATE_REVIEW".to_string()),
        });

        let result = submitter(&store).submit(&context(), draft()).await;

        assert_eq!(
            result,
            Err(UploadError::ReviewRejected(ReviewRejection::DuplicateReview))
        );
    }

    #[tokio::test]
    async fn test_expired_link_refuses_review() {
        let store = Arc::new(MockRecordStore::new());
        let mut ctx = context();
        ctx.link_status = LinkStatus::Expired;

        let result = submitter(&store).submit(&ctx, draft()).await;

        assert!(matches!(result, Err(UploadError::LinkExpired { .. })));
        assert!(store.calls().is_empty());
    }
}
