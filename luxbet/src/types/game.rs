use serde::{Deserialize, Serialize};

/// Game as served by `/api/public/games`; providers disagree on field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGame {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub provider_code: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

/// Provider entry of the catalog; its position is the display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProvider {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub provider_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameList {
    #[serde(default)]
    pub games: Vec<RawGame>,
    #[serde(default)]
    pub providers: Vec<RawProvider>,
}

/// `/api/public/games/{code}/launch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameLaunch {
    #[serde(default)]
    pub game_url: Option<String>,
    #[serde(default)]
    pub launch_url: Option<String>,
}

impl GameLaunch {
    pub fn url(&self) -> Option<&str> {
        non_empty(&self.game_url).or_else(|| non_empty(&self.launch_url))
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.trim().is_empty())
}
