//! API base URL resolution.
//!
//! Pure string computation: decides which backend base URL relative API paths
//! are prefixed with, and which alternates are tried when the primary fails
//! to resolve. Wrong answers surface downstream as failed requests.

use url::Url;

use crate::config::LuxConfig;

/// Subdomain prefix reserved for the API host.
pub const API_SUBDOMAIN: &str = "api.";

/// Base used when there is no origin to derive one from, and during local development.
pub const LOCAL_DEFAULT: &str = "http://localhost:8000";

/// Resolves the primary API base and its ordered fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ApiBaseResolver {
    override_url: Option<String>,
    origin: Option<Url>,
    fallback_ip: Option<String>,
}

impl ApiBaseResolver {
    pub fn new(
        override_url: Option<String>,
        origin: Option<Url>,
        fallback_ip: Option<String>,
    ) -> Self {
        Self {
            override_url,
            origin,
            fallback_ip,
        }
    }

    pub fn from_config(config: &LuxConfig) -> Self {
        Self::new(
            config.api_url.clone(),
            config.page_origin.clone(),
            config.fallback_ip.clone(),
        )
    }

    /// The base URL every request tries first.
    pub fn primary(&self) -> String {
        resolve_base(self.override_url.as_deref(), self.origin.as_ref())
    }

    /// The page origin itself, if one is configured.
    pub fn same_origin(&self) -> Option<String> {
        self.origin.as_ref().and_then(origin_base)
    }

    /// Alternates tried after the primary, in order.
    pub fn fallbacks(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(same) = self.same_origin() {
            out.push(same);
        }
        if let Some(ip) = self.fallback_ip.as_deref().filter(|ip| !ip.is_empty()) {
            out.push(format!("http://{ip}"));
        }
        out
    }

    /// Primary followed by fallbacks, deduplicated with order preserved.
    pub fn candidates(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for base in std::iter::once(self.primary()).chain(self.fallbacks()) {
            if !out.contains(&base) {
                out.push(base);
            }
        }
        out
    }
}

/// Compute the API base from an explicit override and the page origin.
///
/// The override wins verbatim. Local origins map to [`LOCAL_DEFAULT`]. An
/// origin already on the `api.` subdomain is reused; any other host gets
/// `api.` prepended with scheme and port preserved.
pub fn resolve_base(override_url: Option<&str>, origin: Option<&Url>) -> String {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }

    let Some(origin) = origin else {
        return LOCAL_DEFAULT.to_string();
    };
    let Some(host) = origin.host_str() else {
        return LOCAL_DEFAULT.to_string();
    };

    if is_local_host(host) {
        return LOCAL_DEFAULT.to_string();
    }

    if host.starts_with(API_SUBDOMAIN) {
        return origin_base(origin).unwrap_or_else(|| LOCAL_DEFAULT.to_string());
    }

    format!(
        "{}://{}{}{}",
        origin.scheme(),
        API_SUBDOMAIN,
        host,
        port_suffix(origin)
    )
}

fn is_local_host(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]"
}

fn origin_base(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(format!("{}://{}{}", url.scheme(), host, port_suffix(url)))
}

fn port_suffix(url: &Url) -> String {
    url.port().map(|p| format!(":{p}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_override_is_used_verbatim() {
        let origin = url("https://luxbet.site");
        assert_eq!(
            resolve_base(Some("https://backend.example.com/"), Some(&origin)),
            "https://backend.example.com"
        );
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let origin = url("https://luxbet.site");
        assert_eq!(
            resolve_base(Some("  "), Some(&origin)),
            "https://api.luxbet.site"
        );
    }

    #[test]
    fn test_prepends_api_subdomain() {
        let origin = url("https://luxbet.com.br/jogos?x=1");
        assert_eq!(resolve_base(None, Some(&origin)), "https://api.luxbet.com.br");
    }

    #[test]
    fn test_preserves_scheme_and_port() {
        let origin = url("http://luxbet.app:8080");
        assert_eq!(resolve_base(None, Some(&origin)), "http://api.luxbet.app:8080");
    }

    #[test]
    fn test_reuses_api_origin() {
        let origin = url("https://api.luxbet.site/some/page");
        assert_eq!(resolve_base(None, Some(&origin)), "https://api.luxbet.site");
    }

    #[test]
    fn test_no_origin_falls_back_to_local_default() {
        assert_eq!(resolve_base(None, None), LOCAL_DEFAULT);
    }

    #[test]
    fn test_local_origin_uses_local_default() {
        let origin = url("http://localhost:5173");
        assert_eq!(resolve_base(None, Some(&origin)), LOCAL_DEFAULT);
    }

    #[test]
    fn test_candidates_order_and_dedup() {
        let resolver = ApiBaseResolver::new(
            None,
            Some(url("https://luxbet.site")),
            Some("147.93.147.33".into()),
        );
        assert_eq!(
            resolver.candidates(),
            vec![
                "https://api.luxbet.site".to_string(),
                "https://luxbet.site".to_string(),
                "http://147.93.147.33".to_string(),
            ]
        );

        let same = ApiBaseResolver::new(None, Some(url("https://api.luxbet.site")), None);
        assert_eq!(same.candidates(), vec!["https://api.luxbet.site".to_string()]);
    }

    #[test]
    fn test_candidates_without_origin() {
        let resolver = ApiBaseResolver::new(Some("http://10.0.0.5:8000".into()), None, None);
        assert_eq!(resolver.candidates(), vec!["http://10.0.0.5:8000".to_string()]);
    }
}
