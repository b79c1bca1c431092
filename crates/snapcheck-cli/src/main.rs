//! snapcheck CLI - record a browsing session, replay it as a content check
//!
//! Usage:
//!   snapcheck                   Record (headed browser, stop by closing it or Ctrl-C)
//!   snapcheck record            Same as above
//!   snapcheck replay            Replay the baseline headlessly and write the report
//!   snapcheck init              Write the default .snapcheck/config.toml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snapcheck_browser::{
    bridge, ArtifactStore, BrowserConfig, LoginFlow, RecordingSession, ShutdownHandle,
};
use snapcheck_core::{BaselineStore, Credentials, LocatorSynthesizer, SnapcheckConfig};
use snapcheck_replay::{
    NoopNotifier, Notifier, ReplayConfig, ReplayVerifier, ReportBuilder, WebhookNotifier,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const WEBHOOK_URL: &str = "SNAPCHECK_WEBHOOK_URL";
const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "snapcheck")]
#[command(author, version, about = "Record web content and replay it as a regression check")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root holding .snapcheck/ (defaults to current directory)
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Record a manually driven browsing session into the baseline
    Record,

    /// Verify every baseline page against the live application
    Replay,

    /// Write the default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command.unwrap_or(Commands::Record) {
        Commands::Record => cmd_record(&cli.config).await,
        Commands::Replay => cmd_replay(&cli.config).await,
        Commands::Init => cmd_init(&cli.config).await,
    }
}

fn load_config(root: &Path) -> Result<SnapcheckConfig> {
    let config = SnapcheckConfig::load_or_default(root)
        .with_context(|| format!("Failed to load {}", SnapcheckConfig::config_path(root).display()))?;
    Ok(config.resolve_paths(root))
}

fn load_credentials() -> Result<Credentials> {
    // A missing .env file is fine; the process environment may already be set
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Ignoring unreadable .env file: {}", e);
        }
    }
    Ok(Credentials::from_env()?)
}

fn browser_config(config: &SnapcheckConfig, headless: bool) -> BrowserConfig {
    let base = if headless {
        BrowserConfig::default()
    } else {
        BrowserConfig::for_recording()
    };
    BrowserConfig {
        headless,
        window_width: config.browser.window_width,
        window_height: config.browser.window_height,
        test_attribute: config.locator.test_attribute.clone(),
        // The browser must outlive the slowest allowed navigation
        idle_timeout: base.idle_timeout.max(config.browser.navigation_timeout() * 2),
        ..base
    }
}

async fn cmd_init(root: &Path) -> Result<()> {
    let path = SnapcheckConfig::write_default(root)?;
    println!("Initialized snapcheck in {:?}", root);
    println!("Created:");
    println!("  {}", path.display());
    println!("\nNext steps:");
    println!("  1. Set {} / {} / {} (or a .env file)",
        Credentials::BASE_URL, Credentials::USERNAME, Credentials::PASSWORD);
    println!("  2. Run 'snapcheck' and browse the pages to check");
    println!("  3. Run 'snapcheck replay' to verify them");
    Ok(())
}

async fn cmd_record(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let credentials = load_credentials()?;

    let login = LoginFlow::new(&config.login, &credentials, config.browser.navigation_timeout());
    let session = login
        .launch(browser_config(&config, config.browser.record_headless))
        .await
        .context("Failed to start recording browser")?;

    let (tx, rx) = bridge::event_channel();
    let outcome = match bridge::attach(&session, tx.clone()) {
        Ok(()) => {
            bridge::watch_browser(session.browser(), ShutdownHandle::new(tx.clone()), LIVENESS_INTERVAL);
            bridge::watch_interrupt(ShutdownHandle::new(tx));

            println!("Recording. Browse the pages to capture, then close the browser or press Ctrl-C.");
            let store = BaselineStore::new(&config.paths.baseline);
            let synthesizer = LocatorSynthesizer::new(config.locator.test_attribute.clone());
            RecordingSession::new(&session, store, synthesizer).run(rx).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }

    let summary = outcome.context("Recording failed")?;
    info!(reason = %summary.reason, "Recording stopped");
    println!(
        "Recorded {} pages ({} items) to {}",
        summary.pages,
        summary.items,
        config.paths.baseline.display()
    );
    Ok(())
}

async fn cmd_replay(root: &Path) -> Result<()> {
    let config = load_config(root)?;

    // Fail on a missing baseline before a browser is ever started
    let store = BaselineStore::new(&config.paths.baseline);
    let pages = store.load().context("Cannot replay")?;
    info!("Loaded {} baseline pages from {}", pages.len(), store.path().display());

    let credentials = load_credentials()?;
    let login = LoginFlow::new(&config.login, &credentials, config.browser.navigation_timeout());
    let session = login
        .launch(browser_config(&config, config.browser.replay_headless))
        .await
        .context("Failed to start replay browser")?;

    let notifier: Box<dyn Notifier> = match std::env::var(WEBHOOK_URL)
        .ok()
        .or_else(|| config.notify.webhook_url.clone())
    {
        Some(url) => Box::new(WebhookNotifier::new(url)),
        None => Box::new(NoopNotifier),
    };

    let verifier = ReplayVerifier::new(
        &session,
        LocatorSynthesizer::new(config.locator.test_attribute.clone()),
    )
    .with_config(ReplayConfig::from(&config))
    .with_artifacts(
        ArtifactStore::new(&config.paths.artifacts_dir).with_settle(config.replay.screenshot_settle()),
    )
    .with_notifier(notifier);

    let outcome = match verifier.run(&pages).await {
        Ok(run) => ReportBuilder::default()
            .write(&config.paths.report, &run.results)
            .map(|()| run),
        Err(e) => Err(e),
    };
    drop(verifier);

    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }

    let run = outcome.context("Replay aborted")?;
    for result in &run.results {
        let status = if result.pass { "PASS" } else { "FAIL" };
        match &result.failure_reason {
            Some(reason) => println!("  [{}] {} {} - {}", status, result.snapshot.ordinal(), result.snapshot.url, reason),
            None => println!("  [{}] {} {}", status, result.snapshot.ordinal(), result.snapshot.url),
        }
    }
    println!("Report: {}", config.paths.report.display());

    run.ensure_passed()?;
    println!("All {} pages passed", run.total());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_records() {
        let cli = Cli::try_parse_from(["snapcheck"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from("."));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_replay_mode_and_flags() {
        let cli = Cli::try_parse_from(["snapcheck", "replay", "--verbose", "--config", "site"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Replay));
        assert_eq!(cli.config, PathBuf::from("site"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["snapcheck", "verify-everything"]).is_err());
    }

    #[test]
    fn test_browser_config_follows_settings() {
        let mut config = SnapcheckConfig::default();
        config.browser.window_width = 1440;
        config.locator.test_attribute = "data-qa".to_string();

        let record = browser_config(&config, false);
        assert!(!record.headless);
        assert_eq!(record.window_width, 1440);
        assert_eq!(record.test_attribute, "data-qa");
        assert_eq!(record.idle_timeout, BrowserConfig::for_recording().idle_timeout);

        let replay = browser_config(&config, true);
        assert!(replay.headless);
        assert_eq!(replay.idle_timeout, Duration::from_secs(120));
    }
}
