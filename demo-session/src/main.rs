use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lessons_session::{
    HttpIdentityClient, RetryOutcome, Session, SessionConfig, SessionManager,
    persistent_store_from_env,
};

/// Inspect and drive the lessons session stored on this machine
#[derive(Parser, Debug)]
#[command(name = "demo-session", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the restored session without contacting the backend
    Status,
    /// Sign in with a token issued by the backend
    Login {
        #[arg(env = "LESSONS_TOKEN")]
        token: String,
    },
    /// Sign out and clear the stored credential
    Logout,
    /// Re-validate the stored session against the backend
    Refresh,
    /// Poll the backend until the account shows up as premium
    AwaitPremium,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,lessons_session=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = persistent_store_from_env()?;
    let client = Arc::new(HttpIdentityClient::from_env()?);
    let mut config = SessionConfig::from_env();
    // Only the refresh-style commands should talk to the backend
    config.revalidate_on_start = false;

    let manager = SessionManager::start(store, client, config);
    let _subscription = manager.subscribe(|session| {
        tracing::info!("Session is now {:?}", session.status);
    });

    match cli.command {
        Command::Status => print_session(&manager.session())?,
        Command::Login { token } => {
            let session = manager.sign_in_with_token(&token).await?;
            print_session(&session)?;
        }
        Command::Logout => {
            manager.logout()?;
            print_session(&manager.session())?;
        }
        Command::Refresh => {
            let session = manager.refresh().await;
            print_session(&session)?;
        }
        Command::AwaitPremium => {
            let outcome = manager.spawn_premium_sync().outcome().await;
            match &outcome {
                RetryOutcome::Satisfied(_) => tracing::info!("Premium access is active"),
                RetryOutcome::Pending(_) => {
                    tracing::info!("Payment received, premium access is still being activated")
                }
                RetryOutcome::Failed(_) => {
                    tracing::warn!("Premium access could not be confirmed")
                }
                RetryOutcome::SignedOut(_) => tracing::warn!("Signed out while waiting"),
                RetryOutcome::Cancelled(_) => tracing::warn!("Premium sync cancelled"),
            }
            print_session(outcome.session())?;
        }
    }

    Ok(())
}

fn print_session(session: &Session) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(session)?);
    Ok(())
}
