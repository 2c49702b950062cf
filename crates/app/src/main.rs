//! Pulse - Main Entry Point
//!
//! Wires the request layer over the real adapters and runs one command.
//! Without a command it resumes the stored session and shows the profile.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pulse_application::{
    AuthApi, ClientConfig, ProfileApi, ReauthCoordinator, RequestExecutor, SessionController,
    SessionState, TokenStore, TrackingApi, UnauthorizedChannel,
};
use pulse_infrastructure::{
    FileKeyValueStore, ReqwestHttpClient, TokioFileSystem, init_tracing, load_config,
    session_path,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Pulse - health tracking from the command line.
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (TOML or JSON). Defaults to `pulse.*` in the working directory.
    #[arg(long, env = "PULSE_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login { email: String, password: String },

    /// Forget the stored session
    Logout,

    /// Log a glass of water
    Water {
        /// Amount in millilitres
        amount_ml: u32,
    },

    /// Show a day's totals
    Summary {
        /// Day as YYYY-MM-DD; today when omitted
        date: Option<NaiveDate>,
    },
}

struct Client {
    session: SessionController,
    auth: AuthApi,
    profile: ProfileApi,
    tracking: TrackingApi,
}

fn build(config: &ClientConfig) -> Result<(Client, UnauthorizedChannel), Box<dyn std::error::Error>> {
    let backend = Arc::new(FileKeyValueStore::new(
        TokioFileSystem::new(),
        session_path(config),
    ));
    let tokens = TokenStore::new(backend);
    let http = Arc::new(ReqwestHttpClient::new()?);
    let executor = RequestExecutor::new(http, tokens.clone(), config);
    let channel = UnauthorizedChannel::new();
    let coordinator = ReauthCoordinator::new(executor, channel.clone(), config);
    let session = SessionController::new(tokens);

    let client = Client {
        auth: AuthApi::new(coordinator.clone(), session.clone()),
        profile: ProfileApi::new(coordinator.clone()),
        tracking: TrackingApi::new(coordinator),
        session,
    };
    Ok((client, channel))
}

async fn run(client: &Client, command: Option<Command>, resumed: SessionState) -> CliResult {
    match command {
        Some(Command::Login { email, password }) => {
            let grant = client.auth.login(&email, &password).await?;
            tracing::info!(has_user = grant.data.is_some(), "signed in");
            let profile = client.profile.me().await?;
            println!("signed in as {}", profile.email);
        }
        Some(Command::Logout) => {
            client.auth.logout().await;
            println!("signed out");
        }
        Some(Command::Water { amount_ml }) => {
            client.tracking.log_water(amount_ml).await?;
            println!("logged {amount_ml} ml");
        }
        Some(Command::Summary { date }) => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let summary = client.tracking.daily_summary(date).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None if resumed == SessionState::SignedIn => {
            let profile = client.profile.me().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        None => println!("no stored session; run `pulse login EMAIL PASSWORD`"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    // A subscriber installed by the embedding host stays in place.
    let _ = init_tracing(&config.log_filter);

    tracing::info!(
        api = %config.api_base_url,
        "Starting Pulse v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (client, channel) = build(&config)?;
    let _sign_out = client.session.attach(&channel);
    let resumed = client.session.resume().await;

    let logging_out = matches!(cli.command, Some(Command::Logout));
    let result = run(&client, cli.command, resumed).await;

    // The sign-out handler runs inside the failing call, so the state is
    // final here whether the command succeeded or not.
    if !logging_out
        && resumed == SessionState::SignedIn
        && client.session.state() == SessionState::SignedOut
    {
        eprintln!("session expired; please sign in again");
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pulse").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands_parse_typed_arguments() {
        let water = parse(&["water", "250"]).unwrap();
        assert!(matches!(water.command, Some(Command::Water { amount_ml: 250 })));

        let login = parse(&["login", "ana@example.com", "secret"]).unwrap();
        match login.command {
            Some(Command::Login { email, password }) => {
                assert_eq!(email, "ana@example.com");
                assert_eq!(password, "secret");
            }
            _ => panic!("expected login"),
        }

        let summary = parse(&["summary", "2026-03-01"]).unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1);
        assert!(matches!(summary.command, Some(Command::Summary { date }) if date == expected));

        assert!(parse(&[]).unwrap().command.is_none());
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = parse(&["logout", "--config", "/etc/pulse.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Logout)));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pulse.toml")));
    }

    #[test]
    fn test_bad_input_is_rejected() {
        assert!(parse(&["water", "lots"]).is_err());
        assert!(parse(&["summary", "yesterday"]).is_err());
        assert!(parse(&["jog"]).is_err());
    }
}
