//! Input files and the upload gate.
//!
//! A [`SourceFile`] is a named byte buffer with a declared MIME type. The gate
//! runs in two steps so that a wrong type is rejected before any work:
//!
//! 1. [`SourceFile::check_type`]: declared type must be accepted
//!    ([`mime::is_accepted`](crate::mime::is_accepted)), otherwise
//!    [`UploadError::InvalidInputType`].
//! 2. Decode through the backend; failure is [`UploadError::Decode`].

use crate::imaging::BackendError;
use crate::mime;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Please upload a valid image file ({0} is not supported; use PNG, JPEG or GIF)")]
    InvalidInputType(String),
    #[error("Could not decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file offered for conversion.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, declaring the type implied by its extension.
    ///
    /// The type check runs before the read, so a rejected file is never
    /// loaded into memory.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let declared = mime::mime_for_path(path);
        if !mime::is_accepted(declared) {
            return Err(UploadError::InvalidInputType(declared.to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(name, declared, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn check_type(&self) -> Result<(), UploadError> {
        if mime::is_accepted(&self.mime) {
            Ok(())
        } else {
            Err(UploadError::InvalidInputType(self.mime.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_synthetic_png;

    #[test]
    fn accepted_type_passes() {
        let file = SourceFile::new("a.png", "image/png", vec![1u8, 2, 3]);
        assert!(file.check_type().is_ok());
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn text_file_rejected() {
        let file = SourceFile::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = file.check_type().unwrap_err();
        assert!(matches!(err, UploadError::InvalidInputType(ref t) if t == "text/plain"));
        assert!(err.to_string().contains("valid image file"));
    }

    #[test]
    fn from_path_declares_extension_type() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_synthetic_png(tmp.path(), "sunset.png", 20, 10);

        let file = SourceFile::from_path(&path).unwrap();
        assert_eq!(file.name, "sunset.png");
        assert_eq!(file.mime, "image/png");
        assert!(file.size() > 0);
    }

    #[test]
    fn from_path_rejects_before_reading() {
        // The file does not exist; rejection must come from the type, not IO.
        let err = SourceFile::from_path(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, UploadError::InvalidInputType(_)));
    }

    #[test]
    fn from_path_missing_image_is_io_error() {
        let err = SourceFile::from_path(Path::new("/nonexistent/photo.png")).unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }
}
