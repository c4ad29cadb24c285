//! The dialog invocation core: how a validated share request is handed to a
//! dialog provider and how the provider's single completion signal comes back.
//!
//! Providers are injected behind [`DialogProvider`], so the same engine drives
//! the desktop popup flow, the native mobile bridge and the stub providers
//! used in tests. Completion is a `tokio` oneshot channel wrapped in
//! [`Completion`]; resolving consumes the handle, so a provider cannot report
//! twice, and a dropped handle is detected and turned into a failure so no
//! request is ever left pending.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::error::Error;
use crate::models::{DialogMode, ResolvedMode, ShareContent, ShareRequest, ShareResponse};
use crate::state::StagedFiles;

/// What a dialog provider can report back, exhaustively. Anything a concrete
/// bridge receives that does not fit one of these three shapes must be mapped
/// to `Failed`; the set of terminal outcomes never widens silently.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DialogSignal {
    Posted {
        post_id: Option<String>,
        raw: String,
    },
    Cancelled {
        raw: String,
    },
    Failed {
        code: Option<u32>,
        message: String,
        raw: String,
    },
}

/// Single-use completion handle handed to a provider along with the
/// invocation. `resolve` takes `self`, so reporting twice is not expressible;
/// dropping the handle unresolved is detected by the engine.
///
/// The handle may travel to whatever thread the provider completes on.
pub(crate) struct Completion {
    tx: oneshot::Sender<DialogSignal>,
}

impl Completion {
    pub(crate) fn new() -> (Self, oneshot::Receiver<DialogSignal>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub(crate) fn resolve(self, signal: DialogSignal) {
        // The receiver only disappears if the requesting task was dropped;
        // there is nobody left to notify then.
        let _ = self.tx.send(signal);
    }

    pub(crate) fn failed(self, code: Option<u32>, message: impl Into<String>, raw: impl Into<String>) {
        self.resolve(DialogSignal::Failed {
            code,
            message: message.into(),
            raw: raw.into(),
        });
    }
}

/// Holds a [`Completion`] that several racing callbacks may try to claim
/// (e.g. redirect capture vs. window destruction). The first claim wins and
/// resolves; later claims find the slot empty and report `false`.
pub(crate) struct SessionLatch {
    slot: Mutex<Option<Completion>>,
}

impl SessionLatch {
    pub(crate) fn new(completion: Completion) -> Self {
        Self {
            slot: Mutex::new(Some(completion)),
        }
    }

    pub(crate) fn resolve(&self, signal: DialogSignal) -> bool {
        let taken = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match taken {
            Some(completion) => {
                completion.resolve(signal);
                true
            }
            None => false,
        }
    }
}

/// A validated, staged share request as handed to a provider.
#[derive(Debug, Clone)]
pub(crate) struct DialogInvocation {
    pub content: ShareContent,
    pub mode: ResolvedMode,
    /// Path of the staged photo file when the content carried raw bytes and
    /// the provider is native. `content` no longer carries the bytes then.
    pub staged_photo: Option<PathBuf>,
    /// Label of the window the request originated from, when known. Desktop
    /// providers refocus it after the dialog closes.
    pub parent_label: Option<String>,
}

/// The seam to the platform. A provider opens its dialog for one invocation
/// and resolves the completion exactly once, from whatever thread its
/// completion signal arrives on. `open` must not block.
pub(crate) trait DialogProvider: Send + Sync {
    /// Whether this provider drives a platform-native share dialog (mobile
    /// share sheet) rather than the web dialog.
    fn is_native(&self) -> bool;

    /// Whether a dialog could be opened right now (configuration present,
    /// platform capable).
    fn available(&self) -> bool;

    fn open(&self, invocation: DialogInvocation, completion: Completion);
}

/// Drives one share request end to end: validate, stage, dispatch once,
/// translate the single signal into a [`ShareResponse`].
///
/// The engine keeps no per-request state; concurrent calls are independent.
pub(crate) struct DialogEngine {
    provider: Arc<dyn DialogProvider>,
    default_mode: DialogMode,
    staged: Arc<StagedFiles>,
}

impl DialogEngine {
    pub(crate) fn new(
        provider: Arc<dyn DialogProvider>,
        default_mode: DialogMode,
        staged: Arc<StagedFiles>,
    ) -> Self {
        Self {
            provider,
            default_mode,
            staged,
        }
    }

    pub(crate) fn available(&self) -> bool {
        self.provider.available()
    }

    /// Runs one share request. Every path out of this function produces
    /// exactly one `ShareResponse`; rejections resolve before the provider is
    /// ever touched.
    pub(crate) async fn share(
        &self,
        parent_label: Option<String>,
        request: ShareRequest,
    ) -> ShareResponse {
        let ShareRequest { mut content, mode } = request;

        if let Err(err) = content.validate() {
            log::warn!("share content rejected: {err}");
            return ShareResponse::rejected(&err);
        }

        let mode = match mode
            .unwrap_or(self.default_mode)
            .resolve(self.provider.is_native())
        {
            Ok(mode) => mode,
            Err(err) => {
                log::warn!("share mode rejected: {err}");
                return ShareResponse::rejected(&err);
            }
        };

        let staged_photo = match self.stage_photo(&content) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("failed to stage share payload: {err}");
                return ShareResponse::rejected(&err);
            }
        };
        if staged_photo.is_some() {
            // The bytes live on disk now; don't ship them over the bridge too.
            if let ShareContent::Photo { data, .. } = &mut content {
                *data = None;
            }
        }

        let (completion, resolved) = Completion::new();
        let invocation = DialogInvocation {
            content,
            mode,
            staged_photo: staged_photo.clone(),
            parent_label,
        };
        log::debug!("dispatching {mode} share dialog");
        self.provider.open(invocation, completion);

        let response = match resolved.await {
            Ok(signal) => ShareResponse::from_signal(signal),
            Err(_) => {
                log::warn!("share dialog provider dropped its completion handle");
                ShareResponse::abandoned()
            }
        };

        if let Some(path) = &staged_photo {
            if let Err(err) = self.staged.release(path) {
                log::warn!("failed to release staged file: {err}");
            }
        }
        log::debug!("share dialog raw result: {}", response.raw);
        response
    }

    /// Writes raw photo bytes to a managed temporary file for providers that
    /// read the photo from disk. Web dialogs only carry references, so
    /// nothing is staged for them.
    fn stage_photo(&self, content: &ShareContent) -> Result<Option<PathBuf>, Error> {
        if !self.provider.is_native() {
            return Ok(None);
        }
        let ShareContent::Photo {
            data: Some(data),
            name,
            ..
        } = content
        else {
            return Ok(None);
        };
        let name = name.as_deref().unwrap_or("photo.png");
        self.staged.stage(data, name).map(Some)
    }
}

/// Maps a native share plugin reply onto a [`DialogSignal`]. The full reply
/// is preserved verbatim as the raw result; an unrecognized status is a
/// failure, never a fourth outcome.
#[cfg(any(mobile, test))]
pub(crate) fn signal_from_native_reply(reply: serde_json::Value) -> DialogSignal {
    let raw = reply.to_string();
    match reply.get("status").and_then(serde_json::Value::as_str) {
        Some("posted") => DialogSignal::Posted {
            post_id: reply
                .get("postId")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            raw,
        },
        Some("cancelled") => DialogSignal::Cancelled { raw },
        Some("failed") => DialogSignal::Failed {
            code: reply
                .get("errorCode")
                .and_then(serde_json::Value::as_u64)
                .and_then(|code| u32::try_from(code).ok()),
            message: reply
                .get("errorMessage")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("the native share plugin reported a failure")
                .to_string(),
            raw,
        },
        _ => DialogSignal::Failed {
            code: None,
            message: "the native share plugin returned an unrecognized status".to_string(),
            raw,
        },
    }
}
