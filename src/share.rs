use log::debug;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// What the share dialog needs to know about the reader's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareInfo {
    pub url: String,
    pub page_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTarget {
    pub name: &'static str,
    pub url: String,
}

/// Outbound links for every supported network, in display order.
pub fn share_targets(info: &ShareInfo) -> Vec<ShareTarget> {
    let encoded = utf8_percent_encode(&info.url, NON_ALPHANUMERIC).to_string();
    vec![
        ShareTarget {
            name: "Facebook",
            url: format!("https://www.facebook.com/sharer/sharer.php?u={encoded}"),
        },
        ShareTarget {
            name: "Twitter",
            url: format!("https://twitter.com/intent/tweet?url={encoded}"),
        },
        ShareTarget {
            name: "LinkedIn",
            url: format!("https://www.linkedin.com/shareArticle?mini=true&url={encoded}"),
        },
        ShareTarget {
            name: "WhatsApp",
            url: format!("https://api.whatsapp.com/send?text={encoded}"),
        },
        ShareTarget {
            name: "Email",
            url: format!("mailto:?body={encoded}"),
        },
        ShareTarget {
            name: "Instagram",
            url: "https://instagram.com".to_string(),
        },
    ]
}

/// Side effects of the share dialog, kept behind a trait so tests can
/// record them instead of touching the clipboard or a browser.
pub trait ShareActions {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String>;
    fn open_url(&mut self, url: &str) -> Result<(), String>;
}

pub struct SystemShareActions;

impl ShareActions for SystemShareActions {
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(text.to_string()) {
                Ok(()) => {
                    debug!("Copied share link to clipboard");
                    Ok(())
                }
                Err(e) => Err(format!("Failed to copy link to clipboard: {e}")),
            },
            Err(e) => Err(format!("Failed to access clipboard: {e}")),
        }
    }

    fn open_url(&mut self, url: &str) -> Result<(), String> {
        open::that(url).map_err(|e| format!("Failed to open {url}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ShareInfo {
        ShareInfo {
            url: "https://example.org/book?page=3".to_string(),
            page_number: 3,
        }
    }

    #[test]
    fn six_targets_in_order() {
        let names: Vec<_> = share_targets(&info()).iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            ["Facebook", "Twitter", "LinkedIn", "WhatsApp", "Email", "Instagram"]
        );
    }

    #[test]
    fn shared_url_is_encoded() {
        let targets = share_targets(&info());
        assert_eq!(
            targets[0].url,
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fexample%2Eorg%2Fbook%3Fpage%3D3"
        );
        assert!(targets[4].url.starts_with("mailto:?body=https%3A"));
        assert_eq!(targets[5].url, "https://instagram.com");
    }
}
