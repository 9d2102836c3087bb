mod input;
mod output;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rollcall_browser::{ChromiumUi, SessionManager, discover_all_browsers};
use rollcall_core::config::AppConfig;
use rollcall_harvest::{EngineContext, HumanPacer, Orchestrator};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rollcall - harvest group member lists from a web messaging interface", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Additional configuration file (toml, yaml or json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the members of every group listed in the input file (default)
    Harvest(HarvestArgs),
    /// List installed browsers that can be driven
    Browsers,
    /// Close the browser started by a previous run
    Stop,
}

#[derive(clap::Args, Debug)]
struct HarvestArgs {
    /// CSV file with one group name per line
    #[arg(short, long, default_value = "group.csv")]
    input: PathBuf,

    /// Also write all extracted contacts to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Interface entry point
    #[arg(long)]
    url: Option<String>,

    /// Preferred browser: chrome, brave, edge, arc or chromium
    #[arg(long)]
    browser: Option<String>,

    #[arg(long)]
    headless: bool,
}

impl Default for HarvestArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("group.csv"),
            output: None,
            url: None,
            browser: None,
            headless: false,
        }
    }
}

impl HarvestArgs {
    /// Command-line flags win over every configuration layer.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(browser) = &self.browser {
            config.browser = Some(browser.clone());
        }
        if self.headless {
            config.headless = true;
        }
    }
}

fn init_logging(log_file: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::fmt()
                    .with_max_level(level)
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .init();
                return Some(guard);
            }
            Err(e) => eprintln!("⚠️  Cannot open log file {}: {}. Logging to stderr.", path.display(), e),
        }
    }

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();
    None
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = init_logging(args.log_file.as_deref(), args.verbose);

    rollcall_core::init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = AppConfig::load(args.config.as_deref()).context("Configuration is missing or invalid")?;

    match args.command.unwrap_or_else(|| Commands::Harvest(HarvestArgs::default())) {
        Commands::Browsers => {
            list_browsers();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stop => {
            println!("🛑 Stopping the Rollcall browser...");
            if SessionManager::new(&config).stop().await? {
                println!("✅ Browser stopped.");
            } else {
                println!("No running browser session.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Harvest(harvest_args) => {
            harvest_args.apply(&mut config);
            harvest(&config, &harvest_args).await
        }
    }
}

async fn harvest(config: &AppConfig, args: &HarvestArgs) -> Result<ExitCode> {
    let targets = input::load_targets(&args.input)?;
    if targets.is_empty() {
        bail!("No group names found in {}", args.input.display());
    }
    info!("Loaded {} groups from {}", targets.len(), args.input.display());

    let session = SessionManager::new(config)
        .connect()
        .await
        .context("Could not start a browser session")?;
    let page = session.open_page(&config.url).await?;
    let ui = ChromiumUi::new(page, config.url.clone(), config.harvest.timeouts.poll_interval());
    let pacer = HumanPacer::new(config.pacing.clone());

    let orchestrator = Orchestrator::new(EngineContext::new(&ui, &pacer, &config.harvest));
    let harvests = orchestrator.harvest(&targets).await;
    session.detach();

    for harvest in &harvests {
        println!("{}", output::render_harvest(harvest));
    }
    println!("{}", output::render_summary(&harvests));

    if let Some(path) = &args.output {
        let written = output::export_csv(path, &harvests)?;
        println!("💾 Saved {} contacts to {}", written, path.display());
    }

    if harvests.iter().all(|h| h.is_failed()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn list_browsers() {
    let browsers = discover_all_browsers();
    if browsers.is_empty() {
        println!("No supported browsers found.");
        return;
    }

    println!("🌐 Installed browsers:\n");
    for browser in browsers {
        println!(
            "  {:15} | {:16} | {}",
            browser.browser_type.name(),
            browser.version.as_deref().unwrap_or("?"),
            browser.path.display()
        );
    }
}
