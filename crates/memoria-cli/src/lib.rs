use anyhow::Context;
use memoria_core::models::{BatchProgress, PhotoFile};
use memoria_core::{ErrorMetadata, UploadError};
use memoria_upload::guess_content_type;
use std::path::Path;

/// Read a photo from disk, taking its MIME type from the extension.
///
/// Unknown extensions are sent as `application/octet-stream` so the local constraints
/// reject them with a proper message.
pub fn read_photo(path: &Path) -> anyhow::Result<PhotoFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string());
    let content_type = guess_content_type(&filename).unwrap_or("application/octet-stream");
    Ok(PhotoFile::new(filename, content_type, bytes))
}

pub fn format_progress(progress: BatchProgress) -> String {
    format!("Uploading batch {}/{}", progress.current, progress.total)
}

/// User-facing text for an engine error, with the suggested next step.
pub fn describe_error(error: &UploadError) -> String {
    match error.suggested_action() {
        Some(action) => format!("{} ({})", error.client_message(), action),
        None => error.client_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_photo_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portrait.JPG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&[1, 2, 3])
            .unwrap();

        let photo = read_photo(&path).unwrap();
        assert_eq!(photo.filename, "portrait.JPG");
        assert_eq!(photo.content_type, "image/jpeg");
        assert_eq!(photo.len(), 3);
    }

    #[test]
    fn read_photo_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hi").unwrap();
        assert_eq!(
            read_photo(&path).unwrap().content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn read_photo_missing_file() {
        assert!(read_photo(Path::new("/nonexistent/photo.png")).is_err());
    }

    #[test]
    fn progress_text() {
        let text = format_progress(BatchProgress {
            current: 2,
            total: 3,
        });
        assert_eq!(text, "Uploading batch 2/3");
    }

    #[test]
    fn transport_errors_stay_generic() {
        let err = UploadError::TransportFailure {
            message: "tcp connect error 10.0.0.3:8000".to_string(),
        };
        assert!(!describe_error(&err).contains("10.0.0.3"));
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
