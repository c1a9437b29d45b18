//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::rest::retry::RetryPolicy;

/// Explicit API base override, read once at startup.
pub const ENV_API_URL: &str = "LUXBET_API_URL";
/// Origin the client pretends to be served from (page-origin analogue).
pub const ENV_ORIGIN: &str = "LUXBET_ORIGIN";
/// Last-resort server address used when DNS fails.
pub const ENV_FALLBACK_IP: &str = "LUXBET_FALLBACK_IP";

/// Fixed server IP tried after every hostname-based candidate.
pub const DEFAULT_FALLBACK_IP: &str = "147.93.147.33";

/// Configuration for the LuxBet client.
///
/// Use [`Default::default()`] for production defaults, or [`LuxConfig::from_env`]
/// to apply the `LUXBET_*` environment overrides on top of them.
#[derive(Debug, Clone)]
pub struct LuxConfig {
    /// Explicit API base URL; used verbatim when set.
    pub api_url: Option<String>,
    /// Origin of the front end this client acts for (e.g. `https://luxbet.site`).
    pub page_origin: Option<Url>,
    /// IP literal appended to the candidate list as a last resort.
    pub fallback_ip: Option<String>,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Ordered-candidate retry policy for every request.
    pub retry: RetryPolicy,
    /// Background profile refresh interval.
    pub refresh_interval: Duration,
    /// Notification poll interval.
    pub notification_interval: Duration,
    /// How long a surfaced notification stays visible.
    pub notification_dismiss: Duration,
    /// Poll interval while waiting for a PIX deposit to be approved.
    pub deposit_poll_interval: Duration,
    /// Balance sync interval while a game is open.
    pub in_game_sync_interval: Duration,
}

impl Default for LuxConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            page_origin: None,
            fallback_ip: Some(DEFAULT_FALLBACK_IP.to_string()),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            refresh_interval: Duration::from_secs(15),
            notification_interval: Duration::from_secs(10),
            notification_dismiss: Duration::from_secs(5),
            deposit_poll_interval: Duration::from_secs(3),
            in_game_sync_interval: Duration::from_secs(5),
        }
    }
}

impl LuxConfig {
    /// Defaults with `LUXBET_API_URL`, `LUXBET_ORIGIN` and `LUXBET_FALLBACK_IP` applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = non_empty_env(ENV_API_URL) {
            config.api_url = Some(url);
        }
        if let Some(origin) = non_empty_env(ENV_ORIGIN) {
            config.page_origin = Some(Url::parse(&origin)?);
        }
        if let Some(ip) = non_empty_env(ENV_FALLBACK_IP) {
            config.fallback_ip = Some(ip);
        }
        Ok(config)
    }

    /// Replace the explicit API base. Blank input is ignored.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        let api_url = api_url.trim();
        if !api_url.is_empty() {
            self.api_url = Some(api_url.to_string());
        }
        self
    }

    /// Replace the page origin the API host is derived from.
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        self.page_origin = Some(Url::parse(origin.trim())?);
        Ok(self)
    }

    /// Configuration pinned to a single base URL with no fallbacks.
    ///
    /// Handy for tests and for talking to a local backend.
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            api_url: Some(base_url.to_string()),
            fallback_ip: None,
            ..Default::default()
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
