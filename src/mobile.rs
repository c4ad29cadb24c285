//! Mobile share dialogs, driven by the platform's native share plugin.
//!
//! The native side reports one reply per `share` call: a JSON object with a
//! `status` of `posted`, `cancelled` or `failed` plus the platform's details.
//! The reply is kept verbatim as the raw result. `run_mobile_plugin` blocks,
//! so the provider runs it on a blocking task and resolves the completion
//! from there.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tauri::{
    plugin::{PluginApi, PluginHandle},
    AppHandle, Runtime, Window,
};

use crate::dialog::{
    signal_from_native_reply, Completion, DialogEngine, DialogInvocation, DialogProvider,
};
use crate::models::{CanShareResult, DialogConfig, ShareContent, ShareRequest, ShareResponse};
use crate::state::StagedFiles;

#[cfg(target_os = "android")]
const PLUGIN_IDENTIFIER: &str = "plugin.vnidrop.sharedialog";

#[cfg(target_os = "ios")]
tauri::ios_plugin_binding!(init_plugin_share_dialog);

// initializes the Kotlin or Swift plugin classes
pub fn init<R: Runtime>(
    _app: &AppHandle<R>,
    api: PluginApi<R, Option<DialogConfig>>,
) -> crate::Result<ShareDialog<R>> {
    let config = api.config().clone();
    #[cfg(target_os = "android")]
    let handle = api.register_android_plugin(PLUGIN_IDENTIFIER, "ShareDialogPlugin")?;
    #[cfg(target_os = "ios")]
    let handle = api.register_ios_plugin(init_plugin_share_dialog)?;

    let default_mode = config
        .as_ref()
        .and_then(|config| config.default_mode)
        .unwrap_or_default();
    let staged = Arc::new(StagedFiles::new());
    let provider = Arc::new(NativeProvider {
        handle: handle.clone(),
    });
    let engine = DialogEngine::new(provider, default_mode, staged.clone());
    Ok(ShareDialog {
        engine,
        handle,
        staged,
    })
}

/// Access to the share dialog APIs on mobile.
pub struct ShareDialog<R: Runtime> {
    engine: DialogEngine,
    handle: PluginHandle<R>,
    staged: Arc<StagedFiles>,
}

impl<R: Runtime> ShareDialog<R> {
    /// Opens the native share dialog for `request` and resolves once it
    /// reports its outcome.
    pub async fn share(&self, window: Window<R>, request: ShareRequest) -> ShareResponse {
        self.engine
            .share(Some(window.label().to_string()), request)
            .await
    }

    /// Asks the native plugin whether sharing is available on this device.
    pub fn can_share(&self) -> crate::Result<bool> {
        self.handle
            .run_mobile_plugin::<CanShareResult>("canShare", ())
            .map(|reply| reply.value)
            .map_err(Into::into)
    }

    /// Deletes staged temporary files here and on the native side.
    pub fn cleanup(&self) -> crate::Result<()> {
        self.staged.purge();
        self.handle
            .run_mobile_plugin("cleanup", ())
            .map_err(Into::into)
    }
}

/// Payload of the native `share` call. The photo's raw bytes never cross the
/// bridge; when they were staged, `bitmap_path` points at the staged file.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NativeShareArgs {
    content: ShareContent,
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bitmap_path: Option<PathBuf>,
}

struct NativeProvider<R: Runtime> {
    handle: PluginHandle<R>,
}

impl<R: Runtime> DialogProvider for NativeProvider<R> {
    fn is_native(&self) -> bool {
        true
    }

    fn available(&self) -> bool {
        true
    }

    fn open(&self, invocation: DialogInvocation, completion: Completion) {
        let handle = self.handle.clone();
        let args = NativeShareArgs {
            mode: invocation.mode.to_string(),
            bitmap_path: invocation.staged_photo,
            content: invocation.content,
        };
        tauri::async_runtime::spawn_blocking(move || {
            match handle.run_mobile_plugin::<serde_json::Value>("share", args) {
                Ok(reply) => completion.resolve(signal_from_native_reply(reply)),
                Err(err) => {
                    log::warn!("the native share plugin call failed: {err}");
                    completion.failed(None, format!("the native share plugin failed: {err}"), "");
                }
            }
        });
    }
}
