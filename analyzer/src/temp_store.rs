use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::UploadError;
use crate::models::UploadedDocument;

/// Scratch directory holding uploaded PDFs for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

/// An upload written to disk. The file is deleted when this is dropped,
/// including when the run holding it is cancelled.
#[derive(Debug)]
pub struct SavedUpload {
    file: NamedTempFile,
}

impl SavedUpload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Deletes the file now so a failure can be logged.
    pub fn close(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }
    }
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, slot: usize, document: &UploadedDocument) -> Result<SavedUpload, UploadError> {
        let dir = self.dir.clone();
        let bytes = document.bytes.clone();
        let written = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut file = Builder::new()
                .prefix(&format!("QuesPap{slot}-"))
                .suffix(".pdf")
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|r| r);

        let file = written.map_err(|source| UploadError::Save {
            filename: document.filename.clone(),
            source,
        })?;

        log::debug!("Saved {} ({} bytes) to {}", document.filename, document.bytes.len(), file.path().display());
        Ok(SavedUpload { file })
    }
}
