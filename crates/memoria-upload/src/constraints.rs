//! Local file constraints
//!
//! Type and size checks that run before any network call.

use memoria_core::models::PhotoFile;
use memoria_core::{ConstraintViolation, UploadConfig, UploadError};
use std::path::Path;

/// Checks a candidate photo against the configured size ceiling and MIME allow-list.
#[derive(Debug, Clone)]
pub struct LocalConstraints {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl LocalConstraints {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ConstraintViolation> {
        if size == 0 {
            return Err(ConstraintViolation::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ConstraintViolation::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type. Parameters such as `; charset=` are ignored.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ConstraintViolation> {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ConstraintViolation::UnsupportedContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Run every local check on one file.
    pub fn check(&self, file: &PhotoFile) -> Result<(), UploadError> {
        self.validate_content_type(&file.content_type)
            .and_then(|_| self.validate_file_size(file.len()))
            .map_err(|violation| {
                tracing::debug!(
                    file = %file.filename,
                    content_type = %file.content_type,
                    size = file.len(),
                    error = %violation,
                    "File failed local constraints"
                );
                UploadError::LocalConstraintViolation {
                    file: file.filename.clone(),
                    violation,
                }
            })
    }
}

/// MIME type for an image file name, from its extension.
pub fn guess_content_type(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_constraints() -> LocalConstraints {
        LocalConstraints::new(
            10 * 1024 * 1024,
            vec!["image/jpeg".to_string(), "image/png".to_string()],
        )
    }

    #[test]
    fn test_validate_file_size() {
        let c = test_constraints();
        assert!(c.validate_file_size(2 * 1024 * 1024).is_ok());
        assert!(c.validate_file_size(10 * 1024 * 1024).is_ok());
        assert!(matches!(
            c.validate_file_size(11 * 1024 * 1024),
            Err(ConstraintViolation::FileTooLarge { .. })
        ));
        assert_eq!(c.validate_file_size(0), Err(ConstraintViolation::EmptyFile));
    }

    #[test]
    fn test_validate_content_type() {
        let c = test_constraints();
        assert!(c.validate_content_type("image/jpeg").is_ok());
        assert!(c.validate_content_type("IMAGE/PNG").is_ok());
        assert!(c.validate_content_type("image/png; charset=binary").is_ok());
        assert!(c.validate_content_type("image/gif").is_err());
        assert!(c.validate_content_type("application/pdf").is_err());
    }

    #[test]
    fn test_check_reports_file_name() {
        let c = test_constraints();
        let file = PhotoFile::new("scan.pdf", "application/pdf", vec![1u8; 10]);
        match c.check(&file) {
            Err(UploadError::LocalConstraintViolation { file, violation }) => {
                assert_eq!(file, "scan.pdf");
                assert!(matches!(
                    violation,
                    ConstraintViolation::UnsupportedContentType { .. }
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("photo.JPG"), Some("image/jpeg"));
        assert_eq!(guess_content_type("photo.png"), Some("image/png"));
        assert_eq!(guess_content_type("notes.txt"), None);
        assert_eq!(guess_content_type("noextension"), None);
    }
}
