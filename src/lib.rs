//! # tauri-plugin-vnidrop-share-dialog
//!
//! A Tauri plugin that opens a social share dialog and reports its outcome back
//! to the caller: posted, cancelled by the user, or failed, always exactly once
//! per request.
//!
//! On mobile the dialog is the platform's native share flow; on desktop it is
//! the configured dialog service opened in a popup webview. Photo content
//! supplied as Base64 is staged to a temporary file for native dialogs and
//! cleaned up once the dialog is closed or the application exits.
//!
//! ## Installation
//!
//! ```sh
//! # Cargo.toml
//! [dependencies]
//! tauri-plugin-vnidrop-share-dialog = { git = "https://github.com/vnidrop/plugin-share-dialog" }
//! ```
//!
//! ## Configuration
//!
//! The dialog service is configured in `tauri.conf.json`:
//!
//! ```json
//! {
//!   "plugins": {
//!     "vnidrop-share-dialog": {
//!       "appId": "1234567890",
//!       "dialogHost": "https://share.example.com"
//!     }
//!   }
//! }
//! ```
//!
//! Without this entry `can_share` reports `false` on desktop and share attempts
//! resolve with a configuration failure.
//!
//! ## Usage
//!
//! ### Rust
//!
//! You need to initialize the plugin in your `main.rs` or `lib.rs` to register
//! the commands and set up state management.
//!
//! ```rust,ignore
//! // src/main.rs
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(tauri_plugin_vnidrop_share_dialog::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! ### Frontend (JavaScript/TypeScript)
//!
//! The plugin provides a JavaScript API to call the commands.
//!
//! ```js
//! import { invoke } from '@tauri-apps/api/core';
//!
//! // Check if sharing is available
//! const available = await invoke('plugin:vnidrop-share-dialog|can_share');
//!
//! // Share a link; the promise resolves with the dialog's outcome
//! const response = await invoke('plugin:vnidrop-share-dialog|share', {
//!   request: {
//!     content: {
//!       kind: 'link',
//!       contentUrl: 'https://tauri.app',
//!       contentTitle: 'Tauri',
//!     },
//!   },
//! });
//!
//! if (response.succeeded) {
//!   console.log(`posted: ${response.postId ?? 'no id'}`);
//! } else if (response.cancelled) {
//!   console.log('the user closed the dialog');
//! } else {
//!   console.error(response.error.message);
//! }
//! // `raw` is always a string, safe to log on every outcome.
//! console.log(response.raw);
//! ```
//!

use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

pub use models::*;

#[cfg(desktop)]
mod desktop;
#[cfg(mobile)]
mod mobile;

mod commands;
mod dialog;
mod error;
mod models;
mod state;
#[cfg(desktop)]
mod web;

pub use error::{Error, Result};

#[cfg(desktop)]
use desktop::ShareDialog;
#[cfg(mobile)]
use mobile::ShareDialog;

/// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the share dialog APIs.
pub trait ShareDialogExt<R: Runtime> {
    fn share_dialog(&self) -> &ShareDialog<R>;
}

impl<R: Runtime, T: Manager<R>> crate::ShareDialogExt<R> for T {
    fn share_dialog(&self) -> &ShareDialog<R> {
        self.state::<ShareDialog<R>>().inner()
    }
}

/// Initializes the plugin.
///
/// This function sets up the plugin, registers its commands, reads the plugin
/// configuration, and configures the state management for staged temporary
/// files. The cleanup of these files is automatically handled when the
/// application exits.
pub fn init<R: Runtime>() -> TauriPlugin<R, Option<DialogConfig>> {
    Builder::<R, Option<DialogConfig>>::new("vnidrop-share-dialog")
        .invoke_handler(tauri::generate_handler![
            commands::share,
            commands::can_share,
            commands::cleanup,
        ])
        .setup(|app, api| {
            #[cfg(mobile)]
            let share_dialog = mobile::init(app, api)?;
            #[cfg(desktop)]
            let share_dialog = desktop::init(app, api)?;
            app.manage(share_dialog);
            Ok(())
        })
        .on_drop(|app| {
            if let Err(err) = app.share_dialog().cleanup() {
                log::warn!("share dialog cleanup on drop failed: {err}");
            }
        })
        .build()
}
