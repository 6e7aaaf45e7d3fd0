//! File upload port (XEP-0363 HTTP upload).
//!
//! The engine negotiates a slot and drives the transfer through this
//! port; the HTTP mechanics (PUT requests, progress, cancellation) live
//! entirely behind it.

use crate::chat::domain::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// A local file handed to `send_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// File name as presented to the upload service.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Media type of the content.
    pub media_type: String,
}

impl FileHandle {
    /// Creates a file handle.
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64, media_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            media_type: media_type.into(),
        }
    }
}

/// A granted upload slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// URL to PUT the file content to.
    pub put_url: String,
    /// URL the uploaded file will be readable from.
    pub get_url: String,
}

/// Errors that can occur while negotiating or performing an upload.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// The service refused to grant a slot.
    #[error("no upload slot granted: {0}")]
    SlotRefused(String),

    /// The transfer itself failed.
    #[error("upload failed: {0}")]
    TransferFailed(String),
}

impl UploadError {
    /// Creates a slot-refused error.
    #[must_use]
    pub fn slot_refused(message: impl Into<String>) -> Self {
        Self::SlotRefused(message.into())
    }

    /// Creates a transfer-failed error.
    #[must_use]
    pub fn transfer_failed(message: impl Into<String>) -> Self {
        Self::TransferFailed(message.into())
    }
}

/// Port for slot negotiation and file transfer.
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Requests an upload slot for `file` from `service`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::SlotRefused`] if the service declines.
    async fn request_slot(&self, service: &Address, file: &FileHandle) -> UploadResult<UploadSlot>;

    /// Transfers the file into a granted slot.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::TransferFailed`] if the transfer did not
    /// complete.
    async fn upload(&self, slot: &UploadSlot, file: &FileHandle) -> UploadResult<()>;
}
