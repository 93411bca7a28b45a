use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use hotline_monitor::notify::{Notification, NotificationSink, NtfyNotifier, Priority};
use hotline_monitor::{
    Config, GeminiClient, HotlineError, Orchestrator, RawSettings, RemoteAnalysisClient,
    TwilioClient,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotline-monitor")]
#[command(about = "Call a recorded hotline, analyze the announcement and push the result")]
struct Args {
    /// .env file to load before reading settings (default: ./.env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Settings file layered under the process environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Place the call and process its recording (default)
    Run,
    /// Analyze a local recording without placing a call
    Analyze {
        /// Audio file to analyze
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "hotline_monitor=info".into()),
        )
        .init();

    match execute(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Args) -> Result<bool> {
    load_env(args.env_file.as_deref())?;

    let raw = RawSettings::load(args.config.as_deref())?;
    let config = match raw.clone().validate() {
        Ok(config) => config,
        Err(fault) => {
            report_config_fault(&raw, &fault).await;
            return Err(fault.into());
        }
    };

    info!("Hotline Monitor v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {}", config.data_dir.display());

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Analyze { file } => analyze(&config, &file).await,
    }
}

fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            // a missing ./.env is fine, settings may come from the environment
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

async fn run(config: &Config) -> Result<bool> {
    let telephony = TwilioClient::new(&config.twilio.account_sid, &config.twilio.auth_token)
        .context("Failed to create Twilio client")?;
    let inference = GeminiClient::new(&config.gemini.api_key, &config.gemini.model)
        .context("Failed to create Gemini client")?;
    let notifier = NtfyNotifier::new(config.ntfy.credentials.clone());

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(telephony),
        Arc::new(inference),
        Arc::new(notifier),
    );

    let report = orchestrator.run().await;
    Ok(report.succeeded())
}

async fn analyze(config: &Config, file: &Path) -> Result<bool> {
    anyhow::ensure!(file.is_file(), "No such audio file: {}", file.display());

    let inference = GeminiClient::new(&config.gemini.api_key, &config.gemini.model)
        .context("Failed to create Gemini client")?;
    let client = RemoteAnalysisClient::new(Arc::new(inference), config.analysis.clone());

    let outcome = client.analyze_file(file).await;
    println!("Color:   {}", outcome.color());
    println!("Date:    {}", outcome.date());
    println!("Summary: {}", outcome.summary());

    Ok(outcome.is_success())
}

/// Configuration faults are notified only when the ntfy settings themselves
/// were complete enough to reach someone
async fn report_config_fault(raw: &RawSettings, fault: &HotlineError) {
    let Some((credentials, topic)) = raw.error_destination() else {
        return;
    };

    let notification = Notification {
        topic,
        title: fault.notification_title().to_string(),
        message: format!("{}\nTimestamp: {}", fault, Local::now().format("%Y-%m-%d %H:%M:%S")),
        priority: Priority::URGENT,
    };
    NtfyNotifier::new(credentials).send(&notification).await;
}
