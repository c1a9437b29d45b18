//! Game catalog and game sessions.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::balance::{BalanceSnapshot, BalanceSynchronizer};
use crate::error::{LuxError, Result};
use crate::session::SessionStore;
use crate::types::{GameList, RawGame, RawProvider, UserProfile};

/// Group label for games without a provider.
pub const UNKNOWN_PROVIDER: &str = "Outros";

/// A catalog entry with the field-name differences between providers resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEntry {
    pub id: String,
    pub title: String,
    /// Trimmed, upper-cased provider code; empty when unknown.
    pub provider: String,
    pub banner: Option<String>,
    pub code: Option<String>,
}

impl GameEntry {
    /// `code ∨ name ∨ index` for the id, `name ∨ title ∨ "Jogo"` for the title.
    pub fn from_raw(index: usize, raw: RawGame) -> Self {
        let code = non_empty(raw.code);
        let name = non_empty(raw.name);
        let id = code
            .clone()
            .or_else(|| name.clone())
            .unwrap_or_else(|| index.to_string());
        let title = name
            .or_else(|| non_empty(raw.title))
            .unwrap_or_else(|| "Jogo".to_string());
        let provider = non_empty(raw.provider)
            .or_else(|| non_empty(raw.provider_code))
            .map(|p| normalize_provider(&p))
            .unwrap_or_default();
        Self {
            id,
            title,
            provider,
            banner: non_empty(raw.banner),
            code,
        }
    }

    /// Code used to launch the game.
    pub fn launch_code(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameCatalog {
    pub games: Vec<GameEntry>,
    /// Provider display order announced by the backend.
    provider_order: Vec<String>,
}

impl GameCatalog {
    pub fn from_list(list: GameList) -> Self {
        let games = list
            .games
            .into_iter()
            .enumerate()
            .map(|(i, raw)| GameEntry::from_raw(i, raw))
            .collect();
        let provider_order = list
            .providers
            .into_iter()
            .filter_map(provider_code)
            .collect();
        Self {
            games,
            provider_order,
        }
    }

    /// Sorted, de-duplicated, non-empty provider codes.
    pub fn providers(&self) -> Vec<String> {
        self.games
            .iter()
            .filter(|g| !g.provider.is_empty())
            .map(|g| g.provider.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Games whose provider or title matches the filters (case-insensitive).
    pub fn filter(&self, provider: Option<&str>, query: Option<&str>) -> Vec<&GameEntry> {
        let provider = provider.map(normalize_provider);
        let query = query.map(str::to_lowercase);
        self.games
            .iter()
            .filter(|g| provider.as_deref().map_or(true, |p| g.provider == p))
            .filter(|g| {
                query
                    .as_deref()
                    .map_or(true, |q| g.title.to_lowercase().contains(q))
            })
            .collect()
    }

    /// Games grouped by provider, in the backend's provider order; providers it
    /// does not list follow alphabetically.
    pub fn grouped(&self) -> Vec<(String, Vec<&GameEntry>)> {
        let mut groups: Vec<(String, Vec<&GameEntry>)> = Vec::new();
        for game in &self.games {
            let key = if game.provider.is_empty() {
                UNKNOWN_PROVIDER.to_string()
            } else {
                game.provider.clone()
            };
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, list)) => list.push(game),
                None => groups.push((key, vec![game])),
            }
        }
        let rank = |name: &str| {
            self.provider_order
                .iter()
                .position(|p| p == name || p.contains(name) || name.contains(p.as_str()))
        };
        groups.sort_by(|(a, _), (b, _)| match (rank(a), rank(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        });
        groups
    }

    pub fn find(&self, id_or_code: &str) -> Option<&GameEntry> {
        self.games
            .iter()
            .find(|g| g.id == id_or_code || g.code.as_deref() == Some(id_or_code))
    }
}

#[derive(Debug, Clone)]
pub struct Games {
    session: SessionStore,
    balance: BalanceSynchronizer,
    in_game_sync: Duration,
}

impl Games {
    pub fn new(session: SessionStore, balance: BalanceSynchronizer, in_game_sync: Duration) -> Self {
        Self {
            session,
            balance,
            in_game_sync,
        }
    }

    /// Fetch and normalize the public catalog.
    pub async fn list(&self) -> Result<GameCatalog> {
        let list = self.session.http().get_games().await?;
        Ok(GameCatalog::from_list(list))
    }

    /// Start a game. Requires a positive balance.
    pub async fn launch(&self, code: &str) -> Result<GameSession> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LuxError::Validation("game code not found".into()));
        }
        let user = self.current_user().await?;
        if user.balance <= 0.0 {
            return Err(LuxError::Validation(
                "you need a balance to play; make a deposit first".into(),
            ));
        }

        let http = self.session.http();
        let launch = self
            .session
            .authorized(|t| async move { http.launch_game(&t, code).await })
            .await?;
        let url = launch
            .url()
            .ok_or_else(|| LuxError::Validation("the game did not return a launch URL".into()))?
            .to_string();

        info!(code, "game launched");
        Ok(GameSession {
            code: code.to_string(),
            url,
            balance: self.balance.clone(),
            session: self.session.clone(),
            sync_interval: self.in_game_sync,
        })
    }

    async fn current_user(&self) -> Result<UserProfile> {
        if let Some(user) = self.session.user() {
            return Ok(user);
        }
        self.session
            .refresh_user()
            .await?
            .ok_or(LuxError::NotAuthenticated)
    }
}

/// An open game. Funds may be held by the provider until [`GameSession::leave`].
#[derive(Debug, Clone)]
pub struct GameSession {
    pub code: String,
    pub url: String,
    balance: BalanceSynchronizer,
    session: SessionStore,
    sync_interval: Duration,
}

impl GameSession {
    /// Keep the balance in sync while the game is open.
    pub fn start_balance_sync(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let balance = self.balance.clone();
        let period = self.sync_interval;
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = balance.ensure_synced().await {
                            debug!(error = %e, "in-game balance sync failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        debug!("in-game balance sync stopped");
                        return;
                    }
                }
            }
        })
    }

    /// Pull provider-held funds back and refresh the profile.
    pub async fn leave(self) -> Result<BalanceSnapshot> {
        let snapshot = self.balance.ensure_synced().await?;
        if let Err(e) = self.session.refresh_user().await {
            if e.is_unauthorized() {
                return Err(e);
            }
            debug!(error = %e, "profile refresh after game failed");
        }
        info!(code = %self.code, balance = snapshot.display(), "left game");
        Ok(snapshot)
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn normalize_provider(p: &str) -> String {
    p.trim().to_uppercase()
}

fn provider_code(p: RawProvider) -> Option<String> {
    non_empty(p.code)
        .or_else(|| non_empty(p.provider_code))
        .map(|c| normalize_provider(&c))
}
