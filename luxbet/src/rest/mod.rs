pub mod endpoints;
pub mod retry;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LuxConfig;
use crate::error::{LuxError, Result};
use crate::resolver::ApiBaseResolver;

use retry::RetryPolicy;

/// Per-call knobs for [`LuxHttpClient::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
    pub query: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
    /// Per-attempt timeout; the client default when unset.
    pub timeout: Option<Duration>,
    /// Replaces the resolver's fallbacks (the primary is always tried first).
    pub fallbacks: Option<Vec<String>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.json = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn fallbacks(mut self, bases: Vec<String>) -> Self {
        self.fallbacks = Some(bases);
        self
    }
}

/// HTTP client for the LuxBet REST API.
///
/// Every request walks the resolver's candidate bases under the retry policy;
/// see [`LuxHttpClient::request`].
#[derive(Debug, Clone)]
pub struct LuxHttpClient {
    client: Client,
    resolver: ApiBaseResolver,
    timeout: Duration,
    retry: RetryPolicy,
}

impl LuxHttpClient {
    pub fn new(config: &LuxConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, */*"));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            resolver: ApiBaseResolver::from_config(config),
            timeout: config.request_timeout,
            retry: config.retry.clone(),
        })
    }

    /// Get the primary base URL.
    pub fn base_url(&self) -> String {
        self.resolver.primary()
    }

    pub fn resolver(&self) -> &ApiBaseResolver {
        &self.resolver
    }

    /// Ordered base URLs a request for `path` will try.
    pub fn candidates_for(&self, path: &str, fallbacks: Option<&[String]>) -> Vec<String> {
        if is_absolute(path) {
            return vec![String::new()];
        }
        let mut out = vec![self.resolver.primary()];
        let rest = match fallbacks {
            Some(list) => list.to_vec(),
            None => self.resolver.fallbacks(),
        };
        for base in rest {
            let base = base.trim_end_matches('/').to_string();
            if !out.contains(&base) {
                out.push(base);
            }
        }
        out.truncate(self.retry.attempts_for(out.len()));
        out
    }

    /// Issue a request, falling through candidate bases on transport failure.
    ///
    /// Any HTTP response is returned as-is, whatever its status. Only errors
    /// classified as DNS/network failures move on to the next candidate, after
    /// the policy's backoff. When every candidate fails the last transport
    /// error is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<Response> {
        let candidates = self.candidates_for(path, opts.fallbacks.as_deref());
        let timeout = opts.timeout.unwrap_or(self.timeout);
        let total = candidates.len();
        let mut last_err: Option<reqwest::Error> = None;

        for (i, base) in candidates.iter().enumerate() {
            let url = join_url(base, path);
            debug!(attempt = i + 1, total, url = %url, %method, "request");

            let mut req = self.client.request(method.clone(), &url).timeout(timeout);
            if let Some(token) = &opts.bearer {
                req = req.bearer_auth(token);
            }
            if !opts.query.is_empty() {
                req = req.query(&opts.query);
            }
            if let Some(body) = &opts.json {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) => {
                    if i > 0 {
                        info!(base = %base, attempt = i + 1, "fallback base answered");
                    }
                    return Ok(resp);
                }
                Err(e) if self.retry.should_retry(&e) => {
                    warn!(attempt = i + 1, total, url = %url, error = %e, "transport failure");
                    last_err = Some(e);
                    if i + 1 < total {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
                Err(e) => return Err(LuxError::Request(e)),
            }
        }

        match last_err {
            Some(source) => Err(LuxError::Transport {
                attempts: total,
                source,
            }),
            None => Err(LuxError::Validation("no candidate base URL".into())),
        }
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, opts: RequestOptions) -> Result<T> {
        let resp = self.request(Method::GET, path, opts).await?;
        decode_json(resp).await
    }

    /// POST and decode a JSON response.
    pub async fn post<T: DeserializeOwned>(&self, path: &str, opts: RequestOptions) -> Result<T> {
        let resp = self.request(Method::POST, path, opts).await?;
        decode_json(resp).await
    }

    /// POST and only check the status.
    pub async fn post_unit(&self, path: &str, opts: RequestOptions) -> Result<()> {
        let resp = self.request(Method::POST, path, opts).await?;
        expect_success(resp).await
    }

    /// PUT and only check the status.
    pub async fn put_unit(&self, path: &str, opts: RequestOptions) -> Result<()> {
        let resp = self.request(Method::PUT, path, opts).await?;
        expect_success(resp).await
    }
}

/// Map a non-success response to the error taxonomy, or decode its JSON body.
pub async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(error_for_status(status, &String::from_utf8_lossy(&body)));
    }
    Ok(serde_json::from_slice(&body)?)
}

pub async fn expect_success(resp: Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(error_for_status(status, &body))
}

/// 401/403 are authoritative session rejections; 404 and other statuses
/// carry the backend's message.
pub fn error_for_status(status: StatusCode, body: &str) -> LuxError {
    let detail = parse_detail(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.to_string()
        }
    });
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LuxError::Unauthorized {
            status: status.as_u16(),
            detail,
        },
        StatusCode::NOT_FOUND => LuxError::NotFound(detail),
        _ => LuxError::Api {
            status: status.as_u16(),
            detail,
        },
    }
}

/// Extract the human-readable message from a FastAPI error body.
///
/// `detail` may be a string, a list of validation errors (each with `msg`
/// or `message`), or any other JSON value.
pub fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    let text = match detail {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .or_else(|| item.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    Some(text)
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn join_url(base: &str, path: &str) -> String {
    if is_absolute(path) {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
