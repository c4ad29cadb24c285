use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use tauri::Url;

use crate::dialog::DialogSignal;
use crate::error::Error;

/// A single share request as submitted by the caller: what to share and,
/// optionally, which dialog flavor to use. The eventual [`ShareResponse`] is
/// delivered through the future returned by the share APIs, exactly once per
/// request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub content: ShareContent,
    #[serde(default)]
    pub mode: Option<DialogMode>,
}

impl ShareRequest {
    pub fn new(content: ShareContent) -> Self {
        Self {
            content,
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: DialogMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// The payload of a share request.
///
/// The four kinds mirror what platform share dialogs accept: a link, a photo
/// (either raw Base64 bytes or a remote URL), a video, and a classic feed
/// post. All fields are optional where the dialog treats them as optional;
/// [`ShareContent::validate`] enforces the per-kind minimums before anything
/// is dispatched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShareContent {
    #[serde(rename_all = "camelCase")]
    Link {
        content_url: String,
        content_title: Option<String>,
        content_description: Option<String>,
        photo_url: Option<String>,
    },
    /// A photo, supplied either as Base64 `data` (plus a file `name` used for
    /// the staged temporary file) or as a remote `photo_url`. Exactly one of
    /// the two sources must be present.
    #[serde(rename_all = "camelCase")]
    Photo {
        data: Option<String>,
        name: Option<String>,
        photo_url: Option<String>,
        caption: Option<String>,
        #[serde(default)]
        user_generated: bool,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        video_url: String,
        content_title: Option<String>,
        content_description: Option<String>,
        preview_photo_url: Option<String>,
    },
    /// A feed post. At least one of `link`, `picture` or `media_source` must
    /// be present for the dialog to have anything to show.
    #[serde(rename_all = "camelCase")]
    Feed {
        to_id: Option<String>,
        link: Option<String>,
        link_name: Option<String>,
        link_caption: Option<String>,
        link_description: Option<String>,
        picture: Option<String>,
        media_source: Option<String>,
    },
}

impl ShareContent {
    /// Checks that the content can be handed to a dialog at all. This runs
    /// before dispatch; a rejection here never reaches the provider and the
    /// caller still receives a single `ShareResponse` describing the failure.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Link {
                content_url,
                photo_url,
                ..
            } => {
                require_url("contentUrl", content_url)?;
                if let Some(url) = photo_url {
                    require_url("photoUrl", url)?;
                }
                Ok(())
            }
            Self::Photo {
                data,
                name,
                photo_url,
                ..
            } => match (data, photo_url) {
                (Some(_), Some(_)) => Err(Error::InvalidContent(
                    "a photo takes either raw data or a photo URL, not both".into(),
                )),
                (None, None) => Err(Error::InvalidContent(
                    "a photo needs either raw data or a photo URL".into(),
                )),
                (Some(data), None) => validate_photo_bytes(data, name.as_deref()),
                (None, Some(url)) => require_url("photoUrl", url),
            },
            Self::Video { video_url, .. } => {
                if video_url.trim().is_empty() {
                    return Err(Error::InvalidContent("videoUrl must not be empty".into()));
                }
                Ok(())
            }
            Self::Feed {
                to_id,
                link,
                link_name,
                link_caption,
                link_description,
                picture,
                media_source,
            } => {
                if link.is_none() && picture.is_none() && media_source.is_none() {
                    return Err(Error::InvalidContent(
                        "a feed post needs at least one of link, picture or mediaSource".into(),
                    ));
                }
                for (field, value) in [
                    ("toId", to_id),
                    ("link", link),
                    ("linkName", link_name),
                    ("linkCaption", link_caption),
                    ("linkDescription", link_description),
                    ("picture", picture),
                    ("mediaSource", media_source),
                ] {
                    reject_blank(field, value)?;
                }
                Ok(())
            }
        }
    }
}

fn require_url(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidContent(format!("{field} must not be empty")));
    }
    Url::parse(value)
        .map_err(|err| Error::InvalidContent(format!("{field} is not a valid URL: {err}")))?;
    Ok(())
}

fn reject_blank(field: &str, value: &Option<String>) -> Result<(), Error> {
    match value {
        Some(v) if v.trim().is_empty() => Err(Error::InvalidContent(format!(
            "{field} must not be empty when present"
        ))),
        _ => Ok(()),
    }
}

fn validate_photo_bytes(data: &str, name: Option<&str>) -> Result<(), Error> {
    if data.is_empty() {
        return Err(Error::InvalidContent("photo data is empty".into()));
    }
    let decoded = general_purpose::STANDARD
        .decode(data)
        .map_err(|_| Error::InvalidContent("photo data is not valid Base64".into()))?;
    if decoded.is_empty() {
        return Err(Error::InvalidContent("photo data is empty".into()));
    }
    if !is_supported_image(&decoded) {
        return Err(Error::InvalidContent(
            "photo data is not a recognized image format (PNG, JPEG, GIF or WebP)".into(),
        ));
    }
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(Error::InvalidContent(
                "name must not be empty when present".into(),
            ));
        }
    }
    Ok(())
}

fn is_supported_image(bytes: &[u8]) -> bool {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.starts_with(PNG)
        || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
}

/// Which dialog flavor to open.
///
/// `Automatic` picks the platform's preferred flavor (native share sheet on
/// mobile, web dialog on desktop). `Feed` forces the classic feed dialog even
/// for link content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogMode {
    Automatic,
    Native,
    Web,
    Feed,
}

impl DialogMode {
    /// Maps the wire discriminant used by older SDK bindings. Anything
    /// outside the known range is `None`.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Automatic),
            1 => Some(Self::Native),
            2 => Some(Self::Web),
            3 => Some(Self::Feed),
            _ => None,
        }
    }

    /// Resolves the requested mode against what the running platform offers.
    /// `Native` without a native bridge is rejected rather than silently
    /// downgraded.
    pub(crate) fn resolve(self, native_available: bool) -> Result<ResolvedMode, Error> {
        match self {
            Self::Automatic => Ok(if native_available {
                ResolvedMode::Native
            } else {
                ResolvedMode::Web
            }),
            Self::Native if native_available => Ok(ResolvedMode::Native),
            Self::Native => Err(Error::DialogUnavailable(
                "the native share dialog is not available on this platform".into(),
            )),
            Self::Web => Ok(ResolvedMode::Web),
            Self::Feed => Ok(ResolvedMode::Feed),
        }
    }
}

impl Default for DialogMode {
    fn default() -> Self {
        Self::Automatic
    }
}

/// A `DialogMode` after platform resolution; this is what providers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedMode {
    Native,
    Web,
    Feed,
}

impl std::fmt::Display for ResolvedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Web => write!(f, "web"),
            Self::Feed => write!(f, "feed"),
        }
    }
}

/// Structured description of a failed share, carried inside the response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    /// Platform error code, when the provider reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    pub message: String,
}

/// The terminal outcome of one share request.
///
/// Exactly one response is delivered per request, and exactly one of the
/// three outcomes holds: success (`succeeded`), user cancellation
/// (`cancelled`) or failure (`error` present). `raw` is the unmodified
/// serialized form of whatever the dialog reported back; it is an empty
/// string when the dialog had nothing to say, never absent, so it is always
/// safe to log.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub succeeded: bool,
    pub cancelled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureInfo>,
    /// Identifier of the created post, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub raw: String,
}

impl ShareResponse {
    /// Translates a provider signal into the response shape. This is the only
    /// construction path for outcomes that went through a dialog, which keeps
    /// the three outcomes mutually exclusive by construction.
    pub(crate) fn from_signal(signal: DialogSignal) -> Self {
        match signal {
            DialogSignal::Posted { post_id, raw } => Self {
                succeeded: true,
                cancelled: false,
                error: None,
                post_id,
                raw,
            },
            DialogSignal::Cancelled { raw } => Self {
                succeeded: false,
                cancelled: true,
                error: None,
                post_id: None,
                raw,
            },
            DialogSignal::Failed { code, message, raw } => Self {
                succeeded: false,
                cancelled: false,
                error: Some(FailureInfo { code, message }),
                post_id: None,
                raw,
            },
        }
    }

    /// A failure synthesized before any dialog was opened (validation,
    /// staging or mode resolution). No provider data exists yet, so `raw` is
    /// the empty string.
    pub(crate) fn rejected(err: &Error) -> Self {
        Self {
            succeeded: false,
            cancelled: false,
            error: Some(FailureInfo {
                code: None,
                message: err.to_string(),
            }),
            post_id: None,
            raw: String::new(),
        }
    }

    /// The provider went away without reporting anything. Delivered as a
    /// failure so the request is never left pending.
    pub(crate) fn abandoned() -> Self {
        Self {
            succeeded: false,
            cancelled: false,
            error: Some(FailureInfo {
                code: None,
                message: "the share dialog closed without reporting a result".into(),
            }),
            post_id: None,
            raw: String::new(),
        }
    }
}

/// Reply shape of the native `canShare` query.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanShareResult {
    pub value: bool,
}

/// Plugin configuration, read from the `vnidrop-share-dialog` entry in
/// `tauri.conf.json`. Without it the desktop web dialog has nowhere to point,
/// so `canShare` reports `false` and share attempts fail locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogConfig {
    /// Application identifier the dialog service expects in its URLs.
    pub app_id: String,
    /// Base URL of the dialog service, e.g. `https://share.example.com`.
    pub dialog_host: String,
    /// Redirect captured by the popup to read the dialog outcome. A stable
    /// default is used when omitted.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub default_mode: Option<DialogMode>,
}

// A 1x1 transparent PNG, the smallest payload the image sniffer accepts.
// Shared by the test modules that need a photo payload which survives
// validation.
#[cfg(test)]
pub(crate) const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
