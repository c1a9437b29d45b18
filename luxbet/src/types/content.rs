use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub min_deposit: f64,
    #[serde(default)]
    pub bonus_percentage: f64,
    #[serde(default)]
    pub max_bonus: f64,
    #[serde(default)]
    pub cashback_percentage: f64,
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
}

/// `/api/public/promotions` answers either a bare list or `{"promotions": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PromotionPayload {
    List(Vec<Promotion>),
    Wrapped {
        #[serde(default)]
        promotions: Vec<Promotion>,
    },
}

impl PromotionPayload {
    pub fn into_vec(self) -> Vec<Promotion> {
        match self {
            PromotionPayload::List(list) => list,
            PromotionPayload::Wrapped { promotions } => promotions,
        }
    }
}

/// `/api/public/support-config`; every field is optional on an unconfigured backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub whatsapp_link: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub chat_link: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub working_hours: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// `/api/public/tracking-config?platform=...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub pixel_id: Option<String>,
}

impl TrackingConfig {
    pub fn is_enabled(&self) -> bool {
        self.is_active && self.pixel_id.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogoResponse {
    #[serde(default)]
    pub url: Option<String>,
}
