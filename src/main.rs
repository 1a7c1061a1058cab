//! `mfa` - cache AWS MFA session credentials from the command line.

use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use mfacache::backends::aws::{StsConnector, StsSource};
use mfacache::prompt::{StaticPrompt, StdinPrompt, TokenPrompt};
use mfacache::{CacheStore, CacheSummary, Config, Mode, Result, SessionFactory};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mfa", version, about = "Cache AWS MFA session credentials")]
struct Cli {
    /// Profile to use (default: $AWS_PROFILE, then "default")
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Role to assume; caches under the AWS CLI cache directory
    /// (default: the profile's role_arn in ~/.aws/config)
    #[arg(long, global = true)]
    role_arn: Option<String>,

    /// MFA device serial number or ARN (default: $AWS_MFA_SERIAL)
    #[arg(long, global = true)]
    serial_number: Option<String>,

    /// Region for STS calls (default: $AWS_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Lifetime of newly minted credentials, in seconds
    #[arg(long, global = true)]
    duration: Option<u64>,

    /// One-time code; prompts on stdin when omitted
    #[arg(long, global = true)]
    token_code: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint and cache credentials unless valid ones are already cached
    Set,
    /// Display the cached credentials and their remaining lifetime
    Show,
    /// Remove the cached credentials
    Delete,
    /// Delete, then set
    Reset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("mfacache=warn"),
        1 => EnvFilter::new("mfacache=info"),
        _ => EnvFilter::new("mfacache=debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config_from(&cli).with_role_from_profile().await?;
    let store = CacheStore::from_config(&config)?;

    match cli.command {
        Commands::Show => show(&config, &store).await,
        Commands::Delete => delete(&config, &store).await,
        Commands::Set => set(&config, store, cli.token_code).await,
        Commands::Reset => {
            delete(&config, &store).await?;
            set(&config, store, cli.token_code).await
        }
    }
}

fn config_from(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(ref profile) = cli.profile {
        config = config.with_profile(profile);
    }
    if let Some(ref arn) = cli.role_arn {
        config = config.with_role_arn(arn);
    }
    if let Some(ref serial) = cli.serial_number {
        config = config.with_mfa_serial(serial);
    }
    if let Some(ref region) = cli.region {
        config = config.with_region(region);
    }
    if let Some(secs) = cli.duration {
        config = config.with_duration(Duration::from_secs(secs));
    }
    config
}

async fn show(config: &Config, store: &CacheStore) -> Result<()> {
    let key = config.cache_key()?;
    let cached = store.read(&key).await?;
    let path = store.resolve_path(&key);

    println!(
        "{}",
        CacheSummary::new(&key, &path, &cached.credentials, Utc::now())
    );
    Ok(())
}

async fn delete(config: &Config, store: &CacheStore) -> Result<()> {
    let key = config.cache_key()?;
    if store.delete(&key).await? {
        println!("Removed {}", store.resolve_path(&key).display());
    } else {
        println!("No cached credentials for {key}");
    }
    Ok(())
}

async fn set(config: &Config, store: CacheStore, token_code: Option<String>) -> Result<()> {
    let config = config.clone().with_mode(Mode::Interactive);
    let key = config.cache_key()?;

    let prompt: Box<dyn TokenPrompt> = match token_code {
        Some(code) => Box::new(StaticPrompt::new(code)),
        None => Box::new(StdinPrompt),
    };

    let mut factory = SessionFactory::new(
        &config,
        store,
        StsSource::from_config(&config, prompt)?,
        StsConnector::from_config(&config),
    );
    let session = factory.build_session(&key).await?;

    if let Some(warning) = session.warning() {
        eprintln!("Warning: {warning}");
    }

    println!(
        "Credentials for {} valid until {} ({})",
        key,
        session.expires_at().to_rfc3339(),
        session.caller().arn.as_deref().unwrap_or("unknown caller")
    );
    Ok(())
}
