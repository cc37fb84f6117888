use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod aws_mfa;
mod config;
mod credentials;
mod error;

use aws_mfa::{MfaSession, RefreshOutcome};
use config::Config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Profile holding `aws_mfa_device` and the long-lived keys
    #[arg(long, default_value = "default", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    default_profile: String,

    /// Profile receiving the temporary session credentials
    #[arg(long, default_value = "mfa", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    mfa_profile: String,

    /// One-time code from the MFA device (prompted for when omitted)
    #[arg(long)]
    token_code: Option<String>,

    /// Lifetime of the session token, forwarded to `aws sts get-session-token`
    #[arg(long, value_parser = clap::value_parser!(u32).range(900..=129600))]
    duration_seconds: Option<u32>,

    /// Refresh even if the cached session token has not expired
    #[arg(long)]
    force: bool,

    /// aws cli executable
    #[arg(long, default_value = "aws")]
    aws_cli: String,

    /// Credentials file (defaults to $AWS_SHARED_CREDENTIALS_FILE or ~/.aws/credentials)
    #[arg(long)]
    credentials_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> error::Result<()> {
    let config = Config::load_from_env(args.credentials_file, args.default_profile, args.mfa_profile)?
        .set_token_code(args.token_code)
        .set_duration_seconds(args.duration_seconds)
        .set_force(args.force)
        .set_aws_cli(args.aws_cli);
    match MfaSession::from_config(config).refresh().await? {
        RefreshOutcome::StillValid { expires_at } | RefreshOutcome::Refreshed { expires_at } => {
            debug!("Session token valid until {}", expires_at)
        }
    }
    Ok(())
}
