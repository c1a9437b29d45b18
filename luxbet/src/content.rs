//! Public site content: promotions, support contacts, branding.

use tracing::debug;

use crate::error::Result;
use crate::rest::LuxHttpClient;
use crate::types::{Promotion, SupportConfig};

/// Page size used for the promotions listing.
pub const PROMOTIONS_LIMIT: u32 = 50;

#[derive(Debug, Clone)]
pub struct Content {
    http: LuxHttpClient,
}

impl Content {
    pub fn new(http: LuxHttpClient) -> Self {
        Self { http }
    }

    /// Active promotions. With `featured_only` an empty featured list falls
    /// back to all promotions.
    pub async fn promotions(&self, featured_only: bool) -> Result<Vec<Promotion>> {
        let list = self.http.get_promotions(featured_only, PROMOTIONS_LIMIT).await?;
        if featured_only && list.is_empty() {
            debug!("no featured promotions, listing all");
            return self.http.get_promotions(false, PROMOTIONS_LIMIT).await;
        }
        Ok(list)
    }

    pub async fn support_config(&self) -> Result<SupportConfig> {
        self.http.get_support_config().await
    }

    /// Absolute URL of the site logo, if one is configured.
    pub async fn logo_url(&self) -> Result<Option<String>> {
        let logo = self.http.get_logo().await?;
        Ok(logo
            .url
            .filter(|u| !u.is_empty())
            .map(|u| media_url(&self.http.base_url(), &u)))
    }
}

/// Resolve a media path from the backend against the API base.
///
/// Paths already under `/api` are prefixed with the base; anything else is
/// relative to `/api/public/media`. Absolute URLs pass through.
pub fn media_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with("/api") {
        format!("{base}{path}")
    } else {
        format!("{base}/api/public/media{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url() {
        assert_eq!(
            media_url("https://api.luxbet.site", "/api/public/media/logo.png"),
            "https://api.luxbet.site/api/public/media/logo.png"
        );
        assert_eq!(
            media_url("https://api.luxbet.site/", "/uploads/logo.png"),
            "https://api.luxbet.site/api/public/media/uploads/logo.png"
        );
        assert_eq!(
            media_url("https://api.luxbet.site", "https://cdn.test/l.png"),
            "https://cdn.test/l.png"
        );
    }
}
