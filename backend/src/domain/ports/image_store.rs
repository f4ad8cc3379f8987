//! Port abstraction for recipe image file storage.

use async_trait::async_trait;

/// Storage errors raised by image store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageStoreError {
    /// The underlying file operation failed.
    #[error("image store I/O failed: {message}")]
    Io { message: String },
}

impl ImageStoreError {
    /// Create an I/O error with the given message.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist image bytes and return the stored file's reference path.
    ///
    /// The extension reflects the detected image format, not whatever the
    /// client claimed.
    async fn save(&self, data: Vec<u8>, extension: &str) -> Result<String, ImageStoreError>;

    /// Remove a previously stored file. Unknown paths are ignored so a
    /// half-completed replacement cannot wedge the record.
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError>;
}
