//! Browser-like request header profiles, rotated between attempts.

use lmstock_core::HeaderRotation;
use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER, USER_AGENT};
use reqwest::RequestBuilder;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// A coherent set of headers a real browser would send together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderProfile {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
    pub referer: Option<&'static str>,
    /// `(sec-ch-ua, sec-ch-ua-mobile, sec-ch-ua-platform)` for Chromium browsers.
    pub client_hints: Option<(&'static str, &'static str, &'static str)>,
}

impl HeaderProfile {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request
            .header(USER_AGENT, self.user_agent)
            .header(ACCEPT, self.accept)
            .header(ACCEPT_LANGUAGE, self.accept_language)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(referer) = self.referer {
            request = request.header(REFERER, referer);
        }
        if let Some((ua, mobile, platform)) = self.client_hints {
            request = request
                .header("sec-ch-ua", ua)
                .header("sec-ch-ua-mobile", mobile)
                .header("sec-ch-ua-platform", platform);
        }
        request
    }
}

const CHROME_HINTS: &str = r#""Not_A Brand";v="8", "Chromium";v="120", "Google Chrome";v="120""#;

pub const DEFAULT_PROFILES: [HeaderProfile; 8] = [
    HeaderProfile {
        name: "chrome-windows",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "id-ID,id;q=0.9,en;q=0.8",
        referer: Some("https://www.google.com/"),
        client_hints: Some((CHROME_HINTS, "?0", r#""Windows""#)),
    },
    HeaderProfile {
        name: "chrome-macos",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "en-US,en;q=0.9,id;q=0.8",
        referer: Some("https://www.google.com/"),
        client_hints: Some((CHROME_HINTS, "?0", r#""macOS""#)),
    },
    HeaderProfile {
        name: "chrome-linux",
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "id,en-US;q=0.9,en;q=0.8",
        referer: None,
        client_hints: Some((CHROME_HINTS, "?0", r#""Linux""#)),
    },
    HeaderProfile {
        name: "firefox-windows",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "id-ID,id;q=0.8,en-US;q=0.5,en;q=0.3",
        referer: Some("https://www.facebook.com/"),
        client_hints: None,
    },
    HeaderProfile {
        name: "firefox-macos",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-US,en;q=0.5",
        referer: None,
        client_hints: None,
    },
    HeaderProfile {
        name: "safari-macos",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "id-ID,id;q=0.9",
        referer: Some("https://www.bing.com/"),
        client_hints: None,
    },
    HeaderProfile {
        name: "safari-iphone",
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "id-ID,id;q=0.9",
        referer: None,
        client_hints: None,
    },
    HeaderProfile {
        name: "chrome-android",
        user_agent: "Mozilla/5.0 (Linux; Android 14; SM-G991B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "id-ID,id;q=0.9,en;q=0.8",
        referer: Some("https://www.google.com/"),
        client_hints: Some((CHROME_HINTS, "?1", r#""Android""#)),
    },
];

/// Picks a header profile for each attempt.
#[derive(Debug, Clone)]
pub struct HeaderRotator {
    mode: HeaderRotation,
    profiles: Vec<HeaderProfile>,
}

impl HeaderRotator {
    #[must_use]
    pub fn new(mode: HeaderRotation) -> Self {
        Self::with_profiles(mode, DEFAULT_PROFILES.to_vec())
    }

    /// Falls back to [`DEFAULT_PROFILES`] when `profiles` is empty.
    #[must_use]
    pub fn with_profiles(mode: HeaderRotation, profiles: Vec<HeaderProfile>) -> Self {
        let profiles = if profiles.is_empty() {
            DEFAULT_PROFILES.to_vec()
        } else {
            profiles
        };
        Self { mode, profiles }
    }

    /// Profile for 1-based `attempt`.
    ///
    /// Round-robin walks the pool in order, so consecutive attempts never share
    /// a profile while the pool has more than one entry.
    #[must_use]
    pub fn select(&self, attempt: u32) -> &HeaderProfile {
        match self.mode {
            HeaderRotation::RoundRobin => {
                let idx = attempt.saturating_sub(1) as usize % self.profiles.len();
                &self.profiles[idx]
            }
            HeaderRotation::Random => self
                .profiles
                .choose(&mut rand::rng())
                .unwrap_or(&DEFAULT_PROFILES[0]),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
