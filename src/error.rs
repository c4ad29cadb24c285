use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// This enum defines the errors that can be sent back to the frontend.
// Using `thiserror` makes it easy to convert from other error types,
// and `serde::Serialize` allows it to be returned in a command's `Err` variant.
//
// A dialog that was opened and then failed or was dismissed is NOT an `Error`:
// those outcomes travel inside the `ShareResponse`, so callers inspect a
// single result object instead of catching faults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid share content: {0}")]
    InvalidContent(String),
    #[error("Share dialog is not configured: {0}")]
    Unconfigured(String),
    #[error("Share dialog unavailable: {0}")]
    DialogUnavailable(String),
    #[error("Temporary file operation failed: {0}")]
    TempFile(String),
    #[cfg(mobile)]
    #[error(transparent)]
    PluginInvoke(#[from] tauri::plugin::mobile::PluginInvokeError),
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
