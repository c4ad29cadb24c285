use tauri::{command, AppHandle, Runtime, Window};

use crate::{error, models, ShareDialogExt};

/// Opens the share dialog and resolves with its outcome. All three terminal
/// outcomes, cancellation included, arrive through the returned
/// [`models::ShareResponse`]; the command itself never rejects for them.
#[command]
pub async fn share<R: Runtime>(
    app: AppHandle<R>,
    window: Window<R>,
    request: models::ShareRequest,
) -> models::ShareResponse {
    app.share_dialog().share(window, request).await
}

#[command]
pub async fn can_share<R: Runtime>(app: AppHandle<R>) -> Result<bool, error::Error> {
    app.share_dialog().can_share()
}

#[command]
pub async fn cleanup<R: Runtime>(app: AppHandle<R>) -> Result<(), error::Error> {
    app.share_dialog().cleanup()
}
