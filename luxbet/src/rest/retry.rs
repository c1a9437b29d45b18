//! Ordered-candidate retry policy.
//!
//! A request walks the candidate base URLs in order. Only transport failures
//! (the name did not resolve, the connection never came up, the attempt timed
//! out) advance to the next candidate; anything that produced an HTTP response
//! is final.

use std::error::Error as StdError;
use std::time::Duration;

/// Lower-cased message fragments that identify a network-level failure.
const NETWORK_PATTERNS: &[&str] = &[
    "name_not_resolved",
    "name or service not known",
    "failed to lookup address",
    "dns error",
    "failed to fetch",
    "networkerror",
    "connection refused",
    "connection reset",
    "error sending request",
    "operation timed out",
];

/// How a request moves across candidate base URLs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of candidates tried (at least one).
    pub max_attempts: usize,
    /// Fixed pause before moving to the next candidate.
    pub backoff: Duration,
    /// Whether a timed-out attempt advances to the next candidate.
    pub retry_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            retry_on_timeout: true,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no fallback.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
            retry_on_timeout: false,
        }
    }

    /// Number of candidates actually tried out of `available`.
    pub fn attempts_for(&self, available: usize) -> usize {
        available.min(self.max_attempts.max(1))
    }

    /// Whether `err` should move the request on to the next candidate.
    pub fn should_retry(&self, err: &reqwest::Error) -> bool {
        if err.is_timeout() {
            return self.retry_on_timeout;
        }
        is_transport_failure(err)
    }
}

/// Classify a reqwest error as a DNS/network failure.
///
/// Body, decode, builder, redirect and status errors are never transport
/// failures: retrying them against another host would not help.
pub fn is_transport_failure(err: &reqwest::Error) -> bool {
    if err.is_builder() || err.is_body() || err.is_decode() || err.is_redirect() || err.is_status()
    {
        return false;
    }
    if err.is_connect() || err.is_timeout() || err.is_request() {
        return true;
    }
    looks_like_network_failure(&error_chain_text(err))
}

/// Message heuristic shared by every transport classifier.
pub fn looks_like_network_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_PATTERNS.iter().any(|p| lower.contains(p))
}

fn error_chain_text(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}
