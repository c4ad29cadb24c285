//! Desktop share dialogs.
//!
//! Desktop platforms have no share sheet this plugin can drive, so the share
//! dialog is opened as a popup webview pointed at the configured dialog
//! service. The popup's navigation is watched for the completion redirect;
//! closing the popup without reaching it counts as user cancellation. Both
//! paths race through a take-once latch, so the request resolves exactly once
//! no matter which event fires first.

use std::sync::{Arc, Mutex};

use tauri::{
    plugin::PluginApi, AppHandle, Manager, Runtime, WebviewUrl, WebviewWindowBuilder, Window,
    WindowEvent,
};

use crate::dialog::{Completion, DialogEngine, DialogInvocation, DialogProvider, DialogSignal, SessionLatch};
use crate::models::{DialogConfig, ShareRequest, ShareResponse};
use crate::state::StagedFiles;
use crate::web;

const POPUP_WIDTH: f64 = 620.0;
const POPUP_HEIGHT: f64 = 680.0;

pub fn init<R: Runtime>(
    app: &AppHandle<R>,
    api: PluginApi<R, Option<DialogConfig>>,
) -> crate::Result<ShareDialog<R>> {
    let config = api.config().clone();
    let default_mode = config
        .as_ref()
        .and_then(|config| config.default_mode)
        .unwrap_or_default();
    let staged = Arc::new(StagedFiles::new());
    let provider = Arc::new(WebDialogProvider {
        app: app.clone(),
        config,
        pending: Arc::new(Mutex::new(Vec::new())),
    });
    let engine = DialogEngine::new(provider.clone(), default_mode, staged.clone());
    Ok(ShareDialog {
        engine,
        provider,
        staged,
    })
}

/// Access to the share dialog APIs on desktop.
pub struct ShareDialog<R: Runtime> {
    engine: DialogEngine,
    provider: Arc<WebDialogProvider<R>>,
    staged: Arc<StagedFiles>,
}

impl<R: Runtime> ShareDialog<R> {
    /// Opens the share dialog for `request` and resolves once it reports its
    /// outcome. Every outcome, including rejected content and a dismissed
    /// popup, arrives as a [`ShareResponse`].
    pub async fn share(&self, window: Window<R>, request: ShareRequest) -> ShareResponse {
        self.engine
            .share(Some(window.label().to_string()), request)
            .await
    }

    /// Whether a dialog could be opened right now. On desktop this means the
    /// plugin configuration carries a dialog service to point the popup at.
    pub fn can_share(&self) -> crate::Result<bool> {
        Ok(self.engine.available())
    }

    /// Closes any dialog popups still open (each in-flight request resolves
    /// as cancelled) and deletes staged temporary files.
    pub fn cleanup(&self) -> crate::Result<()> {
        self.provider.close_pending();
        self.staged.purge();
        Ok(())
    }
}

/// Opens share dialogs as popup webviews and reads their outcome from the
/// completion redirect.
struct WebDialogProvider<R: Runtime> {
    app: AppHandle<R>,
    config: Option<DialogConfig>,
    /// Labels of popups currently open, so `cleanup` can close them.
    pending: Arc<Mutex<Vec<String>>>,
}

impl<R: Runtime> WebDialogProvider<R> {
    fn close_pending(&self) {
        let labels: Vec<String> = {
            let mut pending = match self.pending.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            pending.drain(..).collect()
        };
        for label in labels {
            if let Some(popup) = self.app.get_webview_window(&label) {
                log::debug!("closing pending share dialog popup {label}");
                let _ = popup.close();
            }
        }
    }
}

fn track(pending: &Mutex<Vec<String>>, label: &str) {
    let mut pending = match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    pending.push(label.to_string());
}

fn untrack(pending: &Mutex<Vec<String>>, label: &str) {
    let mut pending = match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    pending.retain(|l| l != label);
}

impl<R: Runtime> DialogProvider for WebDialogProvider<R> {
    fn is_native(&self) -> bool {
        false
    }

    fn available(&self) -> bool {
        self.config.is_some()
    }

    fn open(&self, invocation: DialogInvocation, completion: Completion) {
        let Some(config) = self.config.as_ref() else {
            completion.failed(
                None,
                "the share dialog is not configured; add a plugin entry to tauri.conf.json",
                "",
            );
            return;
        };

        let url = match web::dialog_url(config, &invocation.content, invocation.mode) {
            Ok(url) => url,
            Err(err) => {
                completion.failed(None, err.to_string(), "");
                return;
            }
        };
        let redirect = match web::redirect_url(config) {
            Ok(redirect) => redirect,
            Err(err) => {
                completion.failed(None, err.to_string(), "");
                return;
            }
        };

        let label = format!("share-dialog-{}", uuid::Uuid::new_v4());
        let latch = Arc::new(SessionLatch::new(completion));
        track(&self.pending, &label);

        // Webview windows must be created on the main thread on some
        // platforms; completion is reported back through the latch.
        let dispatch = {
            let app = self.app.clone();
            let pending = self.pending.clone();
            let latch = latch.clone();
            let label = label.clone();
            let parent_label = invocation.parent_label.clone();
            move || {
                let navigation_handler = {
                    let app = app.clone();
                    let latch = latch.clone();
                    let label = label.clone();
                    move |target: &tauri::Url| {
                        match web::parse_redirect(target, &redirect) {
                            Some(signal) => {
                                if latch.resolve(signal) {
                                    log::debug!("share dialog popup {label} reported a result");
                                }
                                if let Some(popup) = app.get_webview_window(&label) {
                                    let _ = popup.close();
                                }
                                false
                            }
                            None => true,
                        }
                    }
                };

                let built = WebviewWindowBuilder::new(&app, label.as_str(), WebviewUrl::External(url))
                    .title("Share")
                    .inner_size(POPUP_WIDTH, POPUP_HEIGHT)
                    .center()
                    .focused(true)
                    .on_navigation(navigation_handler)
                    .build();

                match built {
                    Ok(popup) => {
                        popup.on_window_event(move |event| {
                            if let WindowEvent::Destroyed = event {
                                // Reaching destruction without a captured
                                // redirect means the user dismissed the
                                // dialog.
                                if latch.resolve(DialogSignal::Cancelled { raw: String::new() }) {
                                    log::debug!("share dialog popup {label} was dismissed");
                                }
                                untrack(&pending, &label);
                                if let Some(parent) = parent_label
                                    .as_deref()
                                    .and_then(|parent| app.get_webview_window(parent))
                                {
                                    let _ = parent.set_focus();
                                }
                            }
                        });
                    }
                    Err(err) => {
                        log::warn!("failed to open the share dialog popup: {err}");
                        untrack(&pending, &label);
                        latch.resolve(DialogSignal::Failed {
                            code: None,
                            message: format!("failed to open the share dialog window: {err}"),
                            raw: String::new(),
                        });
                    }
                }
            }
        };

        if let Err(err) = self.app.run_on_main_thread(dispatch) {
            log::warn!("could not reach the main thread to open the share dialog: {err}");
            untrack(&self.pending, &label);
            latch.resolve(DialogSignal::Failed {
                code: None,
                message: format!("failed to open the share dialog window: {err}"),
                raw: String::new(),
            });
        }
    }
}
