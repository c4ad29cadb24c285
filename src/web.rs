//! Building web dialog URLs and reading the dialog outcome back out of the
//! redirect the dialog service navigates to when it finishes.
//!
//! The dialog service's contract: the share dialog lives under
//! `dialog/share` and takes `href`/`quote`, the feed dialog lives under
//! `dialog/feed` and takes `to`/`link`/`name`/`caption`/`description`/
//! `picture`/`source`. Both get `app_id`, `redirect_uri` and `display=popup`.
//! On completion the dialog navigates to the redirect URI with either a
//! `post_id` or an `error_code`/`error_message` pair in the query; error code
//! 4201 is the service's marker for "the user closed the dialog".

use tauri::Url;

use crate::dialog::DialogSignal;
use crate::error::Error;
use crate::models::{DialogConfig, ResolvedMode, ShareContent};

/// Where the popup is sent when the dialog finishes. Never actually loaded;
/// navigation to it is intercepted and the popup closed.
pub(crate) const DEFAULT_REDIRECT_URI: &str = "https://tauri.localhost/share-dialog/return";

/// Error code the dialog service reports when the user dismissed the dialog.
const USER_CANCELLED_CODE: u32 = 4201;

/// Builds the full dialog URL for one piece of content. `mode` decides which
/// dialog the content is routed to; raw photo bytes cannot ride a URL, so
/// byte-backed photos are refused here and never open a popup.
pub(crate) fn dialog_url(
    config: &DialogConfig,
    content: &ShareContent,
    mode: ResolvedMode,
) -> Result<Url, Error> {
    let base = Url::parse(&config.dialog_host).map_err(|err| {
        Error::Unconfigured(format!("dialogHost is not a valid URL: {err}"))
    })?;
    let redirect = redirect_url(config)?;

    let (path, params) = match mode {
        ResolvedMode::Web => match content {
            ShareContent::Link {
                content_url,
                content_description,
                ..
            } => (
                "dialog/share",
                vec![
                    ("href", Some(content_url.clone())),
                    ("quote", content_description.clone()),
                ],
            ),
            ShareContent::Photo { .. } | ShareContent::Video { .. } | ShareContent::Feed { .. } => {
                ("dialog/feed", feed_params(content)?)
            }
        },
        ResolvedMode::Feed => ("dialog/feed", feed_params(content)?),
        ResolvedMode::Native => {
            return Err(Error::DialogUnavailable(
                "the native share dialog cannot be reached through a web URL".into(),
            ))
        }
    };

    let mut url = base
        .join(path)
        .map_err(|err| Error::Unconfigured(format!("dialogHost cannot carry a path: {err}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("app_id", &config.app_id);
        pairs.append_pair("redirect_uri", redirect.as_str());
        pairs.append_pair("display", "popup");
        for (key, value) in params {
            if let Some(value) = value {
                pairs.append_pair(key, &value);
            }
        }
    }
    Ok(url)
}

/// Maps content onto the feed dialog's parameter set.
fn feed_params(content: &ShareContent) -> Result<Vec<(&'static str, Option<String>)>, Error> {
    match content {
        ShareContent::Link {
            content_url,
            content_title,
            content_description,
            photo_url,
        } => Ok(vec![
            ("link", Some(content_url.clone())),
            ("name", content_title.clone()),
            ("description", content_description.clone()),
            ("picture", photo_url.clone()),
        ]),
        ShareContent::Photo {
            data,
            photo_url,
            caption,
            ..
        } => {
            if data.is_some() {
                return Err(Error::DialogUnavailable(
                    "the web dialog cannot upload raw photo data; supply a photoUrl or use the native dialog"
                        .into(),
                ));
            }
            Ok(vec![
                ("picture", photo_url.clone()),
                ("caption", caption.clone()),
            ])
        }
        ShareContent::Video {
            video_url,
            content_title,
            content_description,
            preview_photo_url,
        } => Ok(vec![
            ("source", Some(video_url.clone())),
            ("name", content_title.clone()),
            ("description", content_description.clone()),
            ("picture", preview_photo_url.clone()),
        ]),
        ShareContent::Feed {
            to_id,
            link,
            link_name,
            link_caption,
            link_description,
            picture,
            media_source,
        } => Ok(vec![
            ("to", to_id.clone()),
            ("link", link.clone()),
            ("name", link_name.clone()),
            ("caption", link_caption.clone()),
            ("description", link_description.clone()),
            ("picture", picture.clone()),
            ("source", media_source.clone()),
        ]),
    }
}

/// The redirect the popup watches for.
pub(crate) fn redirect_url(config: &DialogConfig) -> Result<Url, Error> {
    let raw = config.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI);
    Url::parse(raw)
        .map_err(|err| Error::Unconfigured(format!("redirectUri is not a valid URL: {err}")))
}

/// Decides whether a navigation target is the dialog's completion redirect
/// and, if so, what it says. `None` means "unrelated navigation, let it
/// proceed". The redirect's query string is preserved verbatim as the raw
/// result.
pub(crate) fn parse_redirect(target: &Url, redirect: &Url) -> Option<DialogSignal> {
    if target.scheme() != redirect.scheme()
        || target.host_str() != redirect.host_str()
        || target.port_or_known_default() != redirect.port_or_known_default()
        || target.path() != redirect.path()
    {
        return None;
    }

    let raw = target.query().unwrap_or("").to_string();
    let mut post_id = None;
    let mut errored = false;
    let mut error_code = None;
    let mut error_message = None;
    for (key, value) in target.query_pairs() {
        match key.as_ref() {
            "post_id" => post_id = Some(value.into_owned()),
            "error_code" => {
                // An unparseable code is still an error report.
                errored = true;
                error_code = value.parse::<u32>().ok();
            }
            "error_message" | "error_msg" => error_message = Some(value.into_owned()),
            _ => {}
        }
    }

    Some(if errored {
        match error_code {
            Some(USER_CANCELLED_CODE) => DialogSignal::Cancelled { raw },
            code => DialogSignal::Failed {
                code,
                message: error_message
                    .unwrap_or_else(|| "the share dialog reported an error".to_string()),
                raw,
            },
        }
    } else {
        DialogSignal::Posted { post_id, raw }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DialogMode;

    fn config() -> DialogConfig {
        DialogConfig {
            app_id: "123456".into(),
            dialog_host: "https://share.example.com".into(),
            redirect_uri: None,
            default_mode: Some(DialogMode::Web),
        }
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn link() -> ShareContent {
        ShareContent::Link {
            content_url: "https://tauri.app/?q=a b".into(),
            content_title: Some("Tauri".into()),
            content_description: Some("Build smaller apps".into()),
            photo_url: None,
        }
    }

    #[test]
    fn link_content_in_web_mode_uses_the_share_dialog() {
        let url = dialog_url(&config(), &link(), ResolvedMode::Web).expect("url should build");

        assert_eq!(url.path(), "/dialog/share");
        assert_eq!(param(&url, "app_id").as_deref(), Some("123456"));
        assert_eq!(param(&url, "display").as_deref(), Some("popup"));
        assert_eq!(
            param(&url, "redirect_uri").as_deref(),
            Some(DEFAULT_REDIRECT_URI)
        );
        assert_eq!(param(&url, "href").as_deref(), Some("https://tauri.app/?q=a b"));
        assert_eq!(param(&url, "quote").as_deref(), Some("Build smaller apps"));
        assert!(
            url.as_str().contains("q%3Da+b") || url.as_str().contains("q%3Da%20b"),
            "href must be percent-encoded into the outer query: {url}"
        );
    }

    #[test]
    fn feed_mode_routes_link_content_to_the_feed_dialog() {
        let url = dialog_url(&config(), &link(), ResolvedMode::Feed).expect("url should build");

        assert_eq!(url.path(), "/dialog/feed");
        assert_eq!(param(&url, "link").as_deref(), Some("https://tauri.app/?q=a b"));
        assert_eq!(param(&url, "name").as_deref(), Some("Tauri"));
        assert_eq!(param(&url, "description").as_deref(), Some("Build smaller apps"));
        assert!(param(&url, "href").is_none());
    }

    #[test]
    fn feed_content_maps_every_bundle_key() {
        let content = ShareContent::Feed {
            to_id: Some("777".into()),
            link: Some("https://tauri.app".into()),
            link_name: Some("Tauri".into()),
            link_caption: Some("tauri.app".into()),
            link_description: Some("Build smaller apps".into()),
            picture: Some("https://tauri.app/logo.png".into()),
            media_source: Some("https://tauri.app/intro.mp4".into()),
        };
        let url = dialog_url(&config(), &content, ResolvedMode::Web).expect("url should build");

        assert_eq!(url.path(), "/dialog/feed");
        assert_eq!(param(&url, "to").as_deref(), Some("777"));
        assert_eq!(param(&url, "link").as_deref(), Some("https://tauri.app"));
        assert_eq!(param(&url, "name").as_deref(), Some("Tauri"));
        assert_eq!(param(&url, "caption").as_deref(), Some("tauri.app"));
        assert_eq!(param(&url, "description").as_deref(), Some("Build smaller apps"));
        assert_eq!(param(&url, "picture").as_deref(), Some("https://tauri.app/logo.png"));
        assert_eq!(param(&url, "source").as_deref(), Some("https://tauri.app/intro.mp4"));
    }

    #[test]
    fn video_content_rides_the_feed_dialog_as_a_media_source() {
        let content = ShareContent::Video {
            video_url: "https://tauri.app/intro.mp4".into(),
            content_title: Some("Intro".into()),
            content_description: None,
            preview_photo_url: Some("https://tauri.app/poster.png".into()),
        };
        let url = dialog_url(&config(), &content, ResolvedMode::Web).expect("url should build");

        assert_eq!(url.path(), "/dialog/feed");
        assert_eq!(param(&url, "source").as_deref(), Some("https://tauri.app/intro.mp4"));
        assert_eq!(param(&url, "picture").as_deref(), Some("https://tauri.app/poster.png"));
    }

    #[test]
    fn photo_bytes_cannot_ride_a_url() {
        let content = ShareContent::Photo {
            data: Some("aGk=".into()),
            name: None,
            photo_url: None,
            caption: None,
            user_generated: false,
        };
        assert!(matches!(
            dialog_url(&config(), &content, ResolvedMode::Web),
            Err(Error::DialogUnavailable(_))
        ));
    }

    #[test]
    fn remote_photos_become_a_feed_picture() {
        let content = ShareContent::Photo {
            data: None,
            name: None,
            photo_url: Some("https://tauri.app/logo.png".into()),
            caption: Some("the logo".into()),
            user_generated: true,
        };
        let url = dialog_url(&config(), &content, ResolvedMode::Web).expect("url should build");
        assert_eq!(url.path(), "/dialog/feed");
        assert_eq!(param(&url, "picture").as_deref(), Some("https://tauri.app/logo.png"));
        assert_eq!(param(&url, "caption").as_deref(), Some("the logo"));
    }

    #[test]
    fn a_configured_redirect_overrides_the_default() {
        let mut config = config();
        config.redirect_uri = Some("https://app.example.com/done".into());
        let url = dialog_url(&config, &link(), ResolvedMode::Web).unwrap();
        assert_eq!(
            param(&url, "redirect_uri").as_deref(),
            Some("https://app.example.com/done")
        );
    }

    #[test]
    fn an_invalid_dialog_host_is_a_configuration_error() {
        let mut config = config();
        config.dialog_host = "not a url".into();
        assert!(matches!(
            dialog_url(&config, &link(), ResolvedMode::Web),
            Err(Error::Unconfigured(_))
        ));
    }

    #[test]
    fn redirect_with_a_post_id_is_a_success() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        let target =
            Url::parse("https://tauri.localhost/share-dialog/return?post_id=123_456").unwrap();

        let signal = parse_redirect(&target, &redirect).expect("redirect should match");
        assert_eq!(
            signal,
            DialogSignal::Posted {
                post_id: Some("123_456".into()),
                raw: "post_id=123_456".into(),
            }
        );
    }

    #[test]
    fn redirect_without_parameters_is_still_a_completion() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        let target = Url::parse("https://tauri.localhost/share-dialog/return").unwrap();

        let signal = parse_redirect(&target, &redirect).expect("redirect should match");
        assert_eq!(
            signal,
            DialogSignal::Posted {
                post_id: None,
                raw: String::new(),
            }
        );
    }

    #[test]
    fn the_cancel_error_code_is_a_cancellation_not_a_failure() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        let target = Url::parse(
            "https://tauri.localhost/share-dialog/return?error_code=4201&error_message=User+canceled+the+Dialog+flow",
        )
        .unwrap();

        let signal = parse_redirect(&target, &redirect).expect("redirect should match");
        match signal {
            DialogSignal::Cancelled { raw } => {
                assert_eq!(raw, "error_code=4201&error_message=User+canceled+the+Dialog+flow");
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn other_error_codes_surface_as_failures_with_the_message() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        let target = Url::parse(
            "https://tauri.localhost/share-dialog/return?error_code=190&error_message=expired%20token",
        )
        .unwrap();

        let signal = parse_redirect(&target, &redirect).expect("redirect should match");
        assert_eq!(
            signal,
            DialogSignal::Failed {
                code: Some(190),
                message: "expired token".into(),
                raw: "error_code=190&error_message=expired%20token".into(),
            }
        );
    }

    #[test]
    fn a_garbled_error_code_is_still_a_failure() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        let target =
            Url::parse("https://tauri.localhost/share-dialog/return?error_code=oops").unwrap();

        let signal = parse_redirect(&target, &redirect).expect("redirect should match");
        match signal {
            DialogSignal::Failed { code, raw, .. } => {
                assert_eq!(code, None);
                assert_eq!(raw, "error_code=oops");
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn navigation_elsewhere_is_not_a_completion() {
        let redirect = Url::parse(DEFAULT_REDIRECT_URI).unwrap();
        for target in [
            "https://share.example.com/dialog/share?app_id=1",
            "https://tauri.localhost/some/other/page",
            "http://tauri.localhost/share-dialog/return",
        ] {
            let target = Url::parse(target).unwrap();
            assert!(
                parse_redirect(&target, &redirect).is_none(),
                "{target} must not read as a completion"
            );
        }
    }
}
