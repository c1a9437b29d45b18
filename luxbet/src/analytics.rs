//! Marketing analytics events.
//!
//! Events are handed to an [`AnalyticsSink`]. [`GatedSink`] only lets them
//! through when the backend's tracking config for the platform is active.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::rest::LuxHttpClient;
use crate::types::TrackingConfig;

pub const CURRENCY_BRL: &str = "BRL";
/// Platform queried from `/api/public/tracking-config`.
pub const META_PLATFORM: &str = "meta";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventName {
    PageView,
    InitiateCheckout,
    Purchase,
    Lead,
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventName::PageView => "PageView",
            EventName::InitiateCheckout => "InitiateCheckout",
            EventName::Purchase => "Purchase",
            EventName::Lead => "Lead",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: EventName,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub content_name: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(name: EventName) -> Self {
        Self {
            name,
            value: None,
            currency: None,
            content_name: None,
        }
    }

    pub fn page_view() -> Self {
        Self::new(EventName::PageView)
    }

    pub fn initiate_checkout(value: Decimal, content_name: &str) -> Self {
        Self {
            value: Some(value),
            currency: Some(CURRENCY_BRL.to_string()),
            content_name: Some(content_name.to_string()),
            ..Self::new(EventName::InitiateCheckout)
        }
    }

    /// Approved deposit. First deposits are tagged in `content_name`.
    pub fn purchase(value: Decimal, first_deposit: bool) -> Self {
        let content_name = if first_deposit {
            "Primeiro Depósito"
        } else {
            "Depósito"
        };
        Self {
            value: Some(value),
            currency: Some(CURRENCY_BRL.to_string()),
            content_name: Some(content_name.to_string()),
            ..Self::new(EventName::Purchase)
        }
    }

    pub fn lead(value: Decimal, content_name: &str) -> Self {
        Self {
            value: Some(value),
            currency: Some(CURRENCY_BRL.to_string()),
            content_name: Some(content_name.to_string()),
            ..Self::new(EventName::Lead)
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: AnalyticsEvent);
}

pub type SharedSink = Arc<dyn AnalyticsSink>;

/// Logs each event at info level under the `analytics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track(&self, event: AnalyticsEvent) {
        info!(
            target: "analytics",
            event = %event.name,
            value = ?event.value,
            currency = ?event.currency,
            content_name = ?event.content_name,
            "track"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track(&self, _event: AnalyticsEvent) {}
}

/// Forwards events only while the platform's tracking config is enabled.
pub struct GatedSink {
    inner: SharedSink,
    config: TrackingConfig,
}

impl GatedSink {
    pub fn new(inner: SharedSink, config: TrackingConfig) -> Self {
        Self { inner, config }
    }

    /// Fetch the tracking config for `platform` and wrap `inner` with it.
    ///
    /// Any failure leaves tracking disabled. An enabled sink records the
    /// initial `PageView`.
    pub async fn load(http: &LuxHttpClient, platform: &str, inner: SharedSink) -> Self {
        let config = match http.get_tracking_config(platform).await {
            Ok(config) => config,
            Err(e) => {
                debug!(platform, error = %e, "tracking config unavailable, tracking disabled");
                TrackingConfig::default()
            }
        };
        let sink = Self::new(inner, config);
        if sink.is_enabled() {
            info!(platform, pixel_id = ?sink.config.pixel_id, "tracking enabled");
            sink.track(AnalyticsEvent::page_view());
        } else {
            debug!(platform, "tracking inactive");
        }
        sink
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }
}

impl AnalyticsSink for GatedSink {
    fn track(&self, event: AnalyticsEvent) {
        if self.is_enabled() {
            self.inner.track(event);
        } else {
            debug!(event = %event.name, "tracking inactive, event dropped");
        }
    }
}
