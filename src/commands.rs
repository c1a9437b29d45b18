use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use luxbet::analytics::META_PLATFORM;
use luxbet::{
    FileTokenStore, GatedSink, LuxClient, LuxConfig, LuxError, LuxHttpClient, NewSubAffiliate,
    NoopSink, NotificationEvent, RegisterData, SharedSink, TracingSink, WithdrawalRequest,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{AffiliateCommand, Cli, Command, GamesArgs, ManagerCommand};
use crate::error::CliError;
use crate::output::Output;

/// Overrides the token file location.
pub const ENV_TOKEN_FILE: &str = "LUXBET_TOKEN_FILE";

/// Token file: `--token-file`, then `LUXBET_TOKEN_FILE`, then the per-user config dir.
pub fn token_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| {
        std::env::var_os(ENV_TOKEN_FILE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
    .or_else(|| {
        ProjectDirs::from("site", "luxbet", "lux").map(|d| d.config_dir().join("session.json"))
    })
    .unwrap_or_else(|| PathBuf::from(".lux-session.json"))
}

pub fn build_config(cli: &Cli) -> Result<LuxConfig, CliError> {
    let mut config = LuxConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url);
    }
    if let Some(origin) = cli.origin.as_deref() {
        config = config.with_origin(origin)?;
    }
    Ok(config)
}

/// Events only leave the process when the backend has tracking switched on.
async fn analytics_sink(config: &LuxConfig, command: &Command) -> Result<SharedSink, CliError> {
    if !matches!(command, Command::Deposit(_) | Command::Watch) {
        return Ok(Arc::new(NoopSink));
    }
    let http = LuxHttpClient::new(config)?;
    Ok(Arc::new(
        GatedSink::load(&http, META_PLATFORM, Arc::new(TracingSink)).await,
    ))
}

pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), CliError> {
    let config = build_config(&cli)?;
    let path = token_path(cli.token_file.clone());
    debug!(path = %path.display(), base = %config.api_url.as_deref().unwrap_or("-"), "lux starting");

    let sink = analytics_sink(&config, &cli.command).await?;
    let client = LuxClient::new(config, Arc::new(FileTokenStore::new(path)), sink)?;
    let mut out = Output::new(io::stdout(), cli.json);

    match cli.command {
        Command::Login(args) => {
            let outcome = client.login(&args.username, &args.password).await?;
            let name = client
                .session()
                .user()
                .map(|u| u.username)
                .unwrap_or(args.username);
            let role = if outcome.is_admin { " (admin)" } else { "" };
            out.line(&format!("logged in as {name}{role}"))?;
        }

        Command::Register(args) => {
            let data = RegisterData {
                username: args.username,
                email: args.email,
                password: args.password,
                cpf: args.cpf,
                phone: args.phone,
                affiliate_code: args.affiliate_code,
            };
            client.register(&data).await?;
            out.line(&format!("account created, logged in as {}", data.username))?;
        }

        Command::Logout => {
            client.logout()?;
            out.line("logged out")?;
        }

        Command::Me => {
            let user = client
                .refresh_user()
                .await?
                .ok_or(LuxError::NotAuthenticated)?;
            out.profile(&user)?;
        }

        Command::Balance => {
            let snapshot = client.ensure_synced().await?;
            out.balance(&snapshot)?;
        }

        Command::Deposit(args) => {
            let mut deposit = client.payments().request_deposit(&args.amount).await?;
            out.deposit(&deposit)?;
            if args.wait {
                out.line("waiting for payment (Ctrl-C to stop)...")?;
                let poller = client.notification_poller();
                let poll_handle = poller.start(cancel.child_token());
                let confirmed = client
                    .payments()
                    .await_deposit_confirmation(&mut deposit, &cancel)
                    .await;
                // Give the poller a cycle to report the approval before stopping it.
                if matches!(confirmed, Ok(true)) {
                    let _ = poller.poll_once(&cancel).await;
                }
                cancel.cancel();
                let _ = poll_handle.await;
                if confirmed? {
                    let balance = client.session().user().map(|u| u.balance).unwrap_or(0.0);
                    out.line(&format!(
                        "deposit confirmed, balance {}",
                        luxbet::utils::format_brl(luxbet::utils::to_decimal(balance))
                    ))?;
                } else {
                    out.line("stopped waiting; the deposit is still pending")?;
                }
            }
        }

        Command::Withdraw(args) => {
            let req = WithdrawalRequest {
                amount_input: args.amount,
                pix_key: args.pix_key,
                pix_key_type: args.key_type.into(),
                document_validation: args.document,
            };
            let resp = client.payments().request_withdrawal(&req).await?;
            out.line(&format!(
                "withdrawal requested: id {} status {:?}",
                resp.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                resp.status
            ))?;
        }

        Command::Games(args) => games(&client, &mut out, args).await?,

        Command::Play(args) => {
            let game = client.games().launch(&args.code).await?;
            out.line(&format!("open {}", game.url))?;
            out.line("press Ctrl-C when you are done playing")?;
            let sync = game.start_balance_sync(cancel.child_token());
            cancel.cancelled().await;
            let _ = sync.await;
            let snapshot = game.leave().await?;
            out.balance(&snapshot)?;
        }

        Command::Transactions => {
            let list = client.history().transactions().await?;
            out.transactions(&list)?;
        }

        Command::Bets(args) => {
            let list = client.history().bets(args.status.as_deref()).await?;
            out.bets(&list)?;
        }

        Command::Notifications => {
            let poller = client.notification_poller();
            match poller.poll_once(&cancel).await? {
                Some(n) => out.notification(&n)?,
                None => out.line("no new notifications")?,
            }
        }

        Command::Watch => watch(&client, &mut out, cancel).await?,

        Command::Promotions(args) => {
            let list = client.content().promotions(args.featured).await?;
            out.promotions(&list)?;
        }

        Command::Support => {
            let support = client.content().support_config().await?;
            out.support(&support)?;
        }

        Command::Logo => match client.content().logo_url().await? {
            Some(url) => out.line(&url)?,
            None => out.line("no logo configured")?,
        },

        Command::Affiliate(cmd) => affiliate(&client, &mut out, cmd).await?,

        Command::Manager(cmd) => manager(&client, &mut out, cmd).await?,
    }

    Ok(())
}

async fn games(client: &LuxClient, out: &mut Output<Stdout>, args: GamesArgs) -> Result<(), CliError> {
    let catalog = client.games().list().await?;
    if args.providers {
        return out.providers(&catalog.providers());
    }
    if args.grouped {
        return out.grouped(&catalog);
    }
    let list = catalog.filter(args.provider.as_deref(), args.search.as_deref());
    if list.is_empty() {
        return Err(CliError::NotFound("no games match".into()));
    }
    out.games(&list)
}

/// Keep the session fresh and print notifications until cancelled.
async fn watch(
    client: &LuxClient,
    out: &mut Output<Stdout>,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    if client.session().restore().await?.is_none() {
        return Err(LuxError::NotAuthenticated.into());
    }

    let poller = client.notification_poller();
    let mut events = poller.subscribe();
    let mut session = client.session().subscribe();
    let handles = client.start_background(&poller, cancel.clone());
    info!("watching notifications (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(NotificationEvent::Shown(n)) => out.notification(&n)?,
                Ok(NotificationEvent::Dismissed(id)) => debug!(id, "notification dismissed"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "notification events lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
                if !session.borrow_and_update().is_authenticated() {
                    warn!("session expired, log in again");
                    cancel.cancel();
                    break;
                }
            }
        }
    }

    cancel.cancel();
    for result in futures_util::future::join_all(handles).await {
        if let Err(e) = result {
            warn!(error = %e, "background task failed");
        }
    }
    Ok(())
}

async fn affiliate(
    client: &LuxClient,
    out: &mut Output<Stdout>,
    cmd: AffiliateCommand,
) -> Result<(), CliError> {
    let referral = client.referral();
    match cmd {
        AffiliateCommand::Dashboard => {
            let dashboard = referral.affiliate_dashboard().await?;
            let link = client.referral_link(&dashboard.affiliate_code);
            out.affiliate(&dashboard, link.as_deref())
        }
        AffiliateCommand::Metrics { period } => {
            let metrics = referral.affiliate_metrics(period).await?;
            out.metrics(&metrics)
        }
        AffiliateCommand::Link => {
            let dashboard = referral.affiliate_dashboard().await?;
            match client.referral_link(&dashboard.affiliate_code) {
                Some(link) => out.line(&link),
                None => out.line(&format!(
                    "code {} (set --origin to build the invite link)",
                    dashboard.affiliate_code
                )),
            }
        }
    }
}

async fn manager(
    client: &LuxClient,
    out: &mut Output<Stdout>,
    cmd: ManagerCommand,
) -> Result<(), CliError> {
    let referral = client.referral();
    match cmd {
        ManagerCommand::Dashboard => out.manager(&referral.manager_dashboard().await?),
        ManagerCommand::Subs => out.sub_affiliates(&referral.sub_affiliates().await?),
        ManagerCommand::CreateSub(args) => {
            let sub = NewSubAffiliate {
                username: args.username,
                email: args.email,
                password: args.password,
                affiliate_code: args.code,
                cpa_amount: args.cpa,
                revshare_percentage: args.revshare,
            };
            referral.create_sub_affiliate(&sub).await?;
            out.line(&format!("sub-affiliate {} created", sub.affiliate_code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_path_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("s.json");
        assert_eq!(token_path(Some(flag.clone())), flag);
    }

    #[test]
    fn test_token_path_has_a_default() {
        let path = token_path(None);
        assert!(path.to_string_lossy().ends_with(".json"));
    }
}
