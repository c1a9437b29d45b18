use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use luxbet::{Period, PixKeyType};

/// lux: command-line client for the LuxBet casino backend.
#[derive(Parser, Debug)]
#[command(name = "lux", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// API base URL; overrides LUXBET_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Front-end origin the API host is derived from; overrides LUXBET_ORIGIN
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Where the session tokens are kept; overrides LUXBET_TOKEN_FILE
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Create an account and log in
    Register(RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the current profile
    Me,

    /// Show the balance, pulling funds back from the game provider first
    Balance,

    /// Create a PIX deposit
    Deposit(DepositArgs),

    /// Request a PIX withdrawal
    Withdraw(WithdrawArgs),

    /// List the game catalog
    Games(GamesArgs),

    /// Launch a game and keep the balance synced until Ctrl-C
    Play(PlayArgs),

    /// Deposit and withdrawal history
    Transactions,

    /// Bet history
    Bets(BetsArgs),

    /// Show the next unread notification
    Notifications,

    /// Keep the session fresh and print notifications as they arrive
    Watch,

    /// Active promotions
    Promotions(PromotionsArgs),

    /// Support contacts
    Support,

    /// Site logo URL
    Logo,

    /// Affiliate program views
    #[command(subcommand)]
    Affiliate(AffiliateCommand),

    /// Manager views
    #[command(subcommand)]
    Manager(ManagerCommand),
}

/// Arguments for the `login` subcommand.
#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,

    /// Password; read from LUXBET_PASSWORD when omitted
    #[arg(long, env = "LUXBET_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the `register` subcommand.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,

    pub email: String,

    #[arg(long, env = "LUXBET_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// CPF (digits only)
    #[arg(long)]
    pub cpf: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// Referral code of the inviting affiliate
    #[arg(long = "ref")]
    pub affiliate_code: Option<String>,
}

/// Arguments for the `deposit` subcommand.
#[derive(Args, Debug)]
pub struct DepositArgs {
    /// Amount in BRL, e.g. 50 or 50,00
    pub amount: String,

    /// Wait until the deposit is confirmed
    #[arg(long)]
    pub wait: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KeyType {
    Phone,
    Email,
    Document,
    Random,
}

impl From<KeyType> for PixKeyType {
    fn from(k: KeyType) -> Self {
        match k {
            KeyType::Phone => PixKeyType::PhoneNumber,
            KeyType::Email => PixKeyType::Email,
            KeyType::Document => PixKeyType::Document,
            KeyType::Random => PixKeyType::RandomKey,
        }
    }
}

/// Arguments for the `withdraw` subcommand.
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Amount in BRL
    pub amount: String,

    /// Destination PIX key
    pub pix_key: String,

    #[arg(long, value_enum, default_value = "phone")]
    pub key_type: KeyType,

    /// CPF of the key holder, for document validation
    #[arg(long)]
    pub document: Option<String>,
}

/// Arguments for the `games` subcommand.
#[derive(Args, Debug)]
pub struct GamesArgs {
    /// Only games from this provider
    #[arg(long)]
    pub provider: Option<String>,

    /// Only games whose title contains this text
    #[arg(long)]
    pub search: Option<String>,

    /// Group by provider
    #[arg(long)]
    pub grouped: bool,

    /// List provider codes only
    #[arg(long, conflicts_with_all = ["grouped", "provider", "search"])]
    pub providers: bool,
}

/// Arguments for the `play` subcommand.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Game code
    pub code: String,
}

/// Arguments for the `bets` subcommand.
#[derive(Args, Debug)]
pub struct BetsArgs {
    /// Status filter (e.g. won, lost, pending); "all" for everything
    #[arg(long)]
    pub status: Option<String>,
}

/// Arguments for the `promotions` subcommand.
#[derive(Args, Debug)]
pub struct PromotionsArgs {
    /// Featured promotions only
    #[arg(long)]
    pub featured: bool,
}

#[derive(Subcommand, Debug)]
pub enum AffiliateCommand {
    /// Totals and commission terms
    Dashboard,

    /// Metrics for a period
    Metrics {
        #[arg(long, default_value = "this_month")]
        period: Period,
    },

    /// Invite link for the affiliate code
    Link,
}

#[derive(Subcommand, Debug)]
pub enum ManagerCommand {
    /// Totals across sub-affiliates
    Dashboard,

    /// List sub-affiliates
    Subs,

    /// Create a sub-affiliate
    CreateSub(CreateSubArgs),
}

/// Arguments for `manager create-sub`.
#[derive(Args, Debug)]
pub struct CreateSubArgs {
    pub username: String,

    pub email: String,

    #[arg(long, env = "LUXBET_SUB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Affiliate code for the new account
    #[arg(long)]
    pub code: String,

    /// Fixed commission per qualifying referral (BRL)
    #[arg(long, default_value = "0")]
    pub cpa: f64,

    /// Revenue share percentage (0-100)
    #[arg(long, default_value = "0")]
    pub revshare: f64,
}
