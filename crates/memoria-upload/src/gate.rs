//! Validation gate
//!
//! Local constraints first, then the remote validator. Any failure to obtain a verdict
//! fails closed.

use memoria_core::constants::TRANSPORT_FAILURE_MESSAGE;
use memoria_core::models::{PhotoFile, Verdict};
use memoria_core::{RecordStore, UploadError};
use std::sync::Arc;

use crate::constraints::LocalConstraints;

#[derive(Clone)]
pub struct ValidationGate {
    store: Arc<dyn RecordStore>,
    constraints: LocalConstraints,
}

impl ValidationGate {
    pub fn new(store: Arc<dyn RecordStore>, constraints: LocalConstraints) -> Self {
        Self { store, constraints }
    }

    /// Obtain a verdict for one photo.
    ///
    /// A local constraint failure returns an error without any network call. A rejected
    /// photo is an `Ok` verdict with `accepted == false`; only a missing verdict is an
    /// error, and it always carries the generic transport message.
    pub async fn validate(&self, photo: &PhotoFile) -> Result<Verdict, UploadError> {
        self.constraints.check(photo)?;

        let row = self.store.validate_photo(photo).await.map_err(|e| {
            tracing::error!(
                file = %photo.filename,
                error = %e,
                "Photo validation request failed"
            );
            UploadError::TransportFailure {
                message: TRANSPORT_FAILURE_MESSAGE.to_string(),
            }
        })?;

        let verdict = Verdict::from(row);
        if verdict.accepted {
            tracing::debug!(file = %photo.filename, "Photo accepted by validator");
        } else {
            tracing::info!(
                file = %photo.filename,
                explanation = %verdict.explanation,
                "Photo rejected by validator"
            );
        }
        Ok(verdict)
    }
}
