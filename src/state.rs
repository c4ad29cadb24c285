use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::{engine::general_purpose, Engine as _};
use tempfile::Builder;

use crate::error::Error;

/// Tracks the temporary files this plugin writes for native share dialogs,
/// so every staged photo is deleted again: after its dialog completes, on the
/// `cleanup` command, and when the plugin is dropped.
pub struct StagedFiles {
    dir: PathBuf,
    files: Mutex<Vec<PathBuf>>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::with_dir(std::env::temp_dir().join("tauri-plugin-share-dialog"))
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            files: Mutex::new(Vec::new()),
        }
    }

    /// Decodes Base64 photo data into a uniquely named file under the
    /// plugin's temporary directory and starts tracking it. The returned path
    /// stays on disk until [`release`](Self::release) or
    /// [`purge`](Self::purge).
    pub fn stage(&self, data: &str, name: &str) -> Result<PathBuf, Error> {
        let decoded = general_purpose::STANDARD
            .decode(data)
            .map_err(|_| Error::InvalidContent("Invalid Base64 data provided".to_string()))?;

        // Only the filename part is used; any directory structure in the
        // supplied name is ignored to prevent path traversal.
        let sanitized_name = Path::new(name)
            .file_name()
            .ok_or_else(|| Error::InvalidContent("Invalid file name provided".to_string()))?
            .to_str()
            .ok_or_else(|| {
                Error::InvalidContent("File name contains invalid UTF-8".to_string())
            })?;

        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .map_err(|e| Error::TempFile(format!("Failed to create temp dir: {}", e)))?;
        }

        let mut temp_file = Builder::new()
            .prefix(&format!("{}-", uuid::Uuid::new_v4()))
            .suffix(&format!("-{}", sanitized_name))
            .tempfile_in(&self.dir)
            .map_err(|e| Error::TempFile(format!("Failed to create temp file: {}", e)))?;

        temp_file
            .write_all(&decoded)
            .map_err(|e| Error::TempFile(format!("Failed to write to temp file: {}", e)))?;

        // Disarm the auto-delete; lifetime is managed by this tracker now.
        let (_, path) = temp_file
            .keep()
            .map_err(|e| Error::TempFile(format!("Failed to persist temp file: {}", e)))?;

        let mut files = self
            .files
            .lock()
            .map_err(|e| Error::TempFile(format!("Failed to lock staged file list: {}", e)))?;
        files.push(path.clone());
        Ok(path)
    }

    /// Deletes one staged file and stops tracking it.
    pub fn release(&self, path: &Path) -> Result<(), Error> {
        let mut files = self
            .files
            .lock()
            .map_err(|e| Error::TempFile(format!("Failed to lock staged file list: {}", e)))?;
        if let Some(index) = files.iter().position(|p| p == path) {
            let file_path = files.remove(index);
            std::fs::remove_file(&file_path).map_err(|e| {
                Error::TempFile(format!(
                    "Failed to delete file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
            Ok(())
        } else {
            Err(Error::TempFile(format!(
                "File not found in staged list: {}",
                path.display()
            )))
        }
    }

    /// Deletes every staged file. Failures are logged rather than returned;
    /// this runs on plugin drop where there is nobody left to report to.
    pub fn purge(&self) {
        let mut files = match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("staged file list mutex was poisoned during purge");
                poisoned.into_inner()
            }
        };
        for path in files.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("failed to delete staged file {}: {}", path.display(), e);
            }
        }
    }
}

impl Default for StagedFiles {
    fn default() -> Self {
        Self::new()
    }
}
