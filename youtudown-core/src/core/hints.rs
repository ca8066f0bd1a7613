/// Known yt-dlp failure shapes that the user can do something about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureHint {
    BotCheck,
    RateLimited,
    Cookies,
    ImpersonationUnavailable,
    Extractor,
    Unknown,
}

impl FailureHint {
    /// Classify captured stderr. The first matching rule wins, most specific first.
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("sign in to confirm you're not a bot") {
            return Self::BotCheck;
        }
        if lower.contains("http error 429") || lower.contains("too many requests") {
            return Self::RateLimited;
        }
        if lower.contains("impersonate target") && lower.contains("not available") {
            return Self::ImpersonationUnavailable;
        }
        if lower.contains("cookies") || lower.contains("login") || lower.contains("sign in") {
            return Self::Cookies;
        }
        if lower.contains("error: [") {
            return Self::Extractor;
        }
        Self::Unknown
    }

    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Self::BotCheck => Some(
                "Try this:\n\
                 1. Make sure your browser is signed in to the site\n\
                 2. Set anti_detection.cookies_from_browser in the settings\n\
                 3. Try a different video link\n\
                 4. If it keeps happening, wait a while and retry",
            ),
            Self::RateLimited => Some(
                "Try this:\n\
                 1. Increase anti_detection.sleep_requests in the settings\n\
                 2. Wait a few minutes and retry\n\
                 3. Use a proxy (anti_detection.proxy)",
            ),
            Self::Cookies => Some(
                "Try this:\n\
                 1. Make sure the account is signed in in your browser\n\
                 2. Check the browser allows cookie access\n\
                 3. Export a cookies file manually",
            ),
            Self::ImpersonationUnavailable => Some(
                "Try this:\n\
                 1. Install curl_cffi for the Python running yt-dlp: pip install curl_cffi\n\
                 2. Or reinstall with: pip install --upgrade 'yt-dlp[curl-cffi]'\n\
                 3. Or clear anti_detection.impersonate in the settings",
            ),
            Self::Extractor => Some(
                "Try this:\n\
                 1. Check the video link is correct\n\
                 2. Reload the page to get a fresh link\n\
                 3. The video may be region-locked or removed",
            ),
            Self::Unknown => None,
        }
    }
}
