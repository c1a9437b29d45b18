pub mod analytics;
pub mod balance;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod games;
pub mod history;
pub mod notifications;
pub mod payments;
pub mod referral;
pub mod resolver;
pub mod rest;
pub mod session;
pub mod storage;
pub mod types;
pub mod utils;

// ---- Top-level re-exports for ergonomic usage ----

// Client + config
pub use client::LuxClient;
pub use config::LuxConfig;
pub use error::{LuxError, Result};

// Transport
pub use resolver::{resolve_base, ApiBaseResolver};
pub use rest::retry::RetryPolicy;
pub use rest::{LuxHttpClient, RequestOptions};

// Session + storage
pub use session::{LoginOutcome, Session, SessionStore};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};

// Services
pub use balance::{BalanceSnapshot, BalanceSource, BalanceSynchronizer};
pub use content::Content;
pub use games::{GameCatalog, GameEntry, GameSession, Games};
pub use history::History;
pub use notifications::{NotificationEvent, NotificationPoller};
pub use payments::{DepositSession, DepositStatus, Payments, WithdrawalRequest};
pub use referral::Referral;

// Analytics
pub use analytics::{
    AnalyticsEvent, AnalyticsSink, EventName, GatedSink, NoopSink, SharedSink, TracingSink,
};

// Wire types
pub use types::{
    Affiliate, AffiliateMetrics, AvailableBalance, Bet, ManagerDashboard, Minimums,
    NewSubAffiliate, Notification, NotificationKind, Period, PixKeyType, Promotion, RegisterData,
    Role, SubAffiliate, SupportConfig, TrackingConfig, Transaction, TransactionKind,
    TransactionStatus, UserProfile,
};
