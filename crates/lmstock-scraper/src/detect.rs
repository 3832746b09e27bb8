//! Soft-block detection for response bodies.
//!
//! The site answers some blocked requests with `200 OK` and an interstitial
//! page, so status codes alone are not enough. Detection is a trait so the
//! signature list can change without touching the fetch or retry code.

use crate::error::BlockKind;

/// Classifies a response body as a block page, or `None` for a usable page.
pub trait BlockDetector: Send + Sync + std::fmt::Debug {
    fn detect(&self, body: &str) -> Option<BlockKind>;
}

/// Markers that only show up on anti-bot interstitials.
const CHALLENGE_MARKERS: [&str; 7] = [
    "attention required! | cloudflare",
    "/cdn-cgi/challenge-platform/",
    "cf-chl-",
    "you have been blocked",
    "request blocked",
    "checking your browser before accessing",
    "ddos protection by",
];

/// Block-page wording that is generic enough to appear in ordinary page
/// chrome. Only counts when the page carries no stock anchors.
const GENERIC_CHALLENGE_MARKERS: [&str; 2] = ["access denied", "please enable cookies"];

/// Widgets that need a human. Only count when the page carries no stock
/// anchors, since a normal purchase page may embed a login CAPTCHA.
const CAPTCHA_MARKERS: [&str; 5] = [
    "g-recaptcha",
    "h-captcha",
    "cf-turnstile",
    "hcaptcha.com",
    "captcha",
];

/// Substrings whose presence means the stock content rendered.
const ANCHOR_MARKERS: [&str; 2] = ["price=", "\"price\""];

/// Marker-based detector covering the interstitials seen in practice.
#[derive(Debug, Clone)]
pub struct SignatureDetector {
    challenge_markers: Vec<String>,
    generic_markers: Vec<String>,
    captcha_markers: Vec<String>,
    anchor_markers: Vec<String>,
}

impl Default for SignatureDetector {
    fn default() -> Self {
        Self {
            challenge_markers: CHALLENGE_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            generic_markers: GENERIC_CHALLENGE_MARKERS
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            captcha_markers: CAPTCHA_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            anchor_markers: ANCHOR_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

impl SignatureDetector {
    /// Adds lowercase challenge markers on top of the built-in ones.
    #[must_use]
    pub fn with_extra_challenge_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for marker in markers {
            let marker = marker.into().to_lowercase();
            if !marker.is_empty() && !self.challenge_markers.contains(&marker) {
                self.challenge_markers.push(marker);
            }
        }
        self
    }

    fn has_anchor(&self, lowered: &str) -> bool {
        self.anchor_markers.iter().any(|m| lowered.contains(m.as_str()))
    }
}

impl BlockDetector for SignatureDetector {
    fn detect(&self, body: &str) -> Option<BlockKind> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Some(BlockKind::EmptyBody);
        }

        let lowered = trimmed.to_lowercase();
        if let Some(marker) = self
            .challenge_markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
        {
            return Some(BlockKind::Challenge(marker.clone()));
        }

        if self.has_anchor(&lowered) {
            return None;
        }
        if let Some(marker) = self
            .generic_markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
        {
            return Some(BlockKind::Challenge(marker.clone()));
        }
        self.captcha_markers
            .iter()
            .find(|m| lowered.contains(m.as_str()))
            .map(|m| BlockKind::Captcha(m.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_blocked() {
        let detector = SignatureDetector::default();
        assert_eq!(detector.detect("  \n\t"), Some(BlockKind::EmptyBody));
    }

    #[test]
    fn cloudflare_banner_is_challenge() {
        let body = "<html><title>Attention Required! | Cloudflare</title></html>";
        let detector = SignatureDetector::default();
        assert!(matches!(
            detector.detect(body),
            Some(BlockKind::Challenge(_))
        ));
    }

    #[test]
    fn just_a_moment_needs_a_second_signal() {
        let detector = SignatureDetector::default();
        assert_eq!(
            detector.detect("<p>Just a moment... while we load your cart</p>"),
            None
        );
        assert!(matches!(
            detector.detect("<title>Just a moment...</title><script src=\"cf-chl-opt\"></script>"),
            Some(BlockKind::Challenge(_))
        ));
    }

    #[test]
    fn access_denied_page_is_challenge() {
        let detector = SignatureDetector::default();
        assert_eq!(
            detector.detect(
                "<html><head><title>Access Denied</title></head>\
                 <body>Reference #18.5f2e</body></html>"
            ),
            Some(BlockKind::Challenge("access denied".to_string()))
        );
        assert_eq!(
            detector.detect("<html><body><p>Please enable cookies.</p></body></html>"),
            Some(BlockKind::Challenge("please enable cookies".to_string()))
        );
    }

    #[test]
    fn generic_wording_on_stock_page_is_ignored() {
        let body = r#"<noscript>Please enable cookies</noscript><input price="1000" weight="1">"#;
        assert_eq!(SignatureDetector::default().detect(body), None);
    }

    #[test]
    fn captcha_without_stock_content_is_captcha() {
        let body = r#"<div class="g-recaptcha" data-sitekey="x"></div>"#;
        let detector = SignatureDetector::default();
        assert_eq!(
            detector.detect(body),
            Some(BlockKind::Captcha("g-recaptcha".to_string()))
        );
    }

    #[test]
    fn captcha_widget_on_stock_page_is_ignored() {
        let body = r#"<input price="1000" weight="1"><div class="g-recaptcha"></div>"#;
        let detector = SignatureDetector::default();
        assert_eq!(detector.detect(body), None);
    }

    #[test]
    fn normal_page_passes() {
        let body = r#"<div><span>Emas 1 gr</span><input price="1000" weight="1"></div>"#;
        assert_eq!(SignatureDetector::default().detect(body), None);
    }

    #[test]
    fn extra_markers_are_matched_case_insensitively() {
        let detector =
            SignatureDetector::default().with_extra_challenge_markers(["Sedang Dalam Antrian"]);
        assert_eq!(
            detector.detect("<h1>SEDANG DALAM ANTRIAN</h1>"),
            Some(BlockKind::Challenge("sedang dalam antrian".to_string()))
        );
    }
}
