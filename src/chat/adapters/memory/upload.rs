//! Scriptable in-memory file uploader.

use crate::chat::domain::Address;
use crate::chat::ports::upload::{FileHandle, FileUploader, UploadError, UploadResult, UploadSlot};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// File uploader that grants deterministic slots.
///
/// Thread-safe via internal locking. Suitable for unit tests only.
/// Slot URLs are derived from the file name; either phase can be
/// scripted to fail.
#[derive(Debug, Default, Clone)]
pub struct ScriptedFileUploader {
    slot_failure: Arc<Mutex<Option<UploadError>>>,
    transfer_failure: Arc<Mutex<Option<UploadError>>>,
    uploaded: Arc<Mutex<Vec<FileHandle>>>,
}

impl ScriptedFileUploader {
    /// Creates an uploader where every transfer succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a failure for every subsequent slot request.
    pub fn refuse_slots(&self, error: UploadError) {
        if let Ok(mut guard) = self.slot_failure.lock() {
            *guard = Some(error);
        }
    }

    /// Arms a failure for every subsequent transfer.
    pub fn fail_transfers(&self, error: UploadError) {
        if let Ok(mut guard) = self.transfer_failure.lock() {
            *guard = Some(error);
        }
    }

    /// Returns a copy of every file transferred so far.
    #[must_use]
    pub fn uploaded(&self) -> Vec<FileHandle> {
        self.uploaded.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FileUploader for ScriptedFileUploader {
    async fn request_slot(&self, service: &Address, file: &FileHandle) -> UploadResult<UploadSlot> {
        if let Ok(guard) = self.slot_failure.lock()
            && let Some(error) = guard.clone()
        {
            return Err(error);
        }
        let base = format!("https://{}/{}", service.as_str(), file.name);
        Ok(UploadSlot {
            put_url: format!("{base}?token=put"),
            get_url: base,
        })
    }

    async fn upload(&self, _slot: &UploadSlot, file: &FileHandle) -> UploadResult<()> {
        if let Ok(guard) = self.transfer_failure.lock()
            && let Some(error) = guard.clone()
        {
            return Err(error);
        }
        if let Ok(mut guard) = self.uploaded.lock() {
            guard.push(file.clone());
        }
        Ok(())
    }
}
