//! Sensing Cascade CLI
//!
//! ```bash
//! # Full motion → location → fusion run
//! sensing-cascade run --motion-duration-ms 5000
//!
//! # Individual tools
//! sensing-cascade scan-location --network eduroam --network Library-Guest
//! sensing-cascade track-motion --seconds 15
//! sensing-cascade history --clear
//! sensing-cascade config --fusion inference
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::info;

use sensing_cascade_core::{ProgressEvent, ProgressKind, SourceProvider};

use crate::models::settings::{FusionMode, SettingsUpdate};
use crate::services::cascade::{PhaseOrchestrator, NO_MOTION_RESULTS};
use crate::services::sensing::SensingStack;
use crate::storage::ConfigService;
use crate::utils::error::AppResult;

/// Sensing Cascade Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "sensing-cascade")]
#[command(author, version, about = "Motion, location and context fusion from on-device signals")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.sensing-cascade/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Answer with a canned text generator instead of Ollama
    #[arg(long, global = true)]
    pub offline: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full motion → location → fusion cascade
    Run(RunArgs),

    /// Scan nearby networks and analyze the location once
    ScanLocation(InferenceArgs),

    /// Track motion for a while, then print the history
    TrackMotion(TrackArgs),

    /// Show or clear persisted motion and location history
    History(HistoryArgs),

    /// Show or update the persisted configuration
    Config(ConfigArgs),
}

/// Per-invocation inference overrides
#[derive(Args, Debug, Default)]
pub struct InferenceArgs {
    /// Analyze these networks instead of scanning (repeatable)
    #[arg(long = "network", value_name = "SSID")]
    pub networks: Vec<String>,

    /// Ollama model
    #[arg(long)]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

impl InferenceArgs {
    fn update(self) -> SettingsUpdate {
        SettingsUpdate {
            model: self.model,
            base_url: self.base_url,
            static_networks: (!self.networks.is_empty()).then_some(self.networks),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inference: InferenceArgs,

    /// Length of the motion phase
    #[arg(long)]
    pub motion_duration_ms: Option<u64>,

    /// Characters of each history passed to fusion
    #[arg(long)]
    pub fusion_chars: Option<usize>,

    /// Fusion stage: placeholder or inference
    #[arg(long, value_parser = parse_fusion_mode)]
    pub fusion: Option<FusionMode>,

    /// Print progress events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TrackArgs {
    /// How long to sample
    #[arg(long, default_value_t = 10)]
    pub seconds: u64,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Delete persisted history instead of showing it
    #[arg(long)]
    pub clear: bool,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Restore defaults
    #[arg(long)]
    pub reset: bool,

    #[arg(long)]
    pub motion_duration_ms: Option<u64>,

    #[arg(long)]
    pub fusion_chars: Option<usize>,

    #[arg(long, value_parser = parse_fusion_mode)]
    pub fusion: Option<FusionMode>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for persisted history
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

fn parse_fusion_mode(s: &str) -> Result<FusionMode, String> {
    FusionMode::from_str(s).ok_or_else(|| {
        format!("unknown fusion mode '{}' (expected placeholder or inference)", s)
    })
}

/// Execute a parsed command line
pub async fn execute(cli: Cli) -> AppResult<()> {
    let mut service = match &cli.config {
        Some(path) => ConfigService::from_path(path)?,
        None => ConfigService::new()?,
    };
    if cli.offline {
        service.override_config(SettingsUpdate {
            offline: Some(true),
            ..Default::default()
        })?;
    }

    match cli.command {
        Commands::Run(args) => run_cascade(&mut service, args).await,
        Commands::ScanLocation(args) => scan_location(&mut service, args).await,
        Commands::TrackMotion(args) => track_motion(&service, args).await,
        Commands::History(args) => history(&service, args),
        Commands::Config(args) => config(&mut service, args),
    }
}

fn stack_for(service: &ConfigService) -> AppResult<SensingStack> {
    SensingStack::build(service.get_config(), &service.data_dir()?, Handle::current())
}

async fn run_cascade(service: &mut ConfigService, args: RunArgs) -> AppResult<()> {
    let mut update = args.inference.update();
    update.motion_duration_ms = args.motion_duration_ms;
    update.fusion_history_chars = args.fusion_chars;
    update.fusion_mode = args.fusion;
    service.override_config(update)?;

    let stack = stack_for(service)?;
    // The host lives as long as this command; the orchestrator only sees a weak handle.
    let host = Arc::new(());
    let orchestrator = PhaseOrchestrator::with_handle(
        Handle::current(),
        service.get_config().cascade.clone(),
        stack.collaborators(Arc::new(Arc::downgrade(&host))),
    )?;

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    orchestrator.start(move |event| {
        let _ = tx.send(event);
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                print_event(&event, args.json)?;
                if event.is_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                orchestrator.stop();
                eprintln!("Stopped.");
                break;
            }
        }
    }

    orchestrator.close();
    drop(host);
    Ok(())
}

fn print_event(event: &ProgressEvent, json: bool) -> AppResult<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event.kind {
        ProgressKind::Completed => println!("\n{}", event.text),
        ProgressKind::Failed => eprintln!("{}", event),
        ProgressKind::Update | ProgressKind::Notice => println!("{}", event),
    }
    Ok(())
}

async fn scan_location(service: &mut ConfigService, args: InferenceArgs) -> AppResult<()> {
    service.override_config(args.update())?;
    let stack = stack_for(service)?;

    let networks = stack.scanner.scan().await?;
    println!("Nearby networks ({}):", networks.len());
    for network in &networks {
        println!("  {}", network);
    }

    let analyzer = stack.provider.acquire_location()?;
    let outcome = analyzer.analyze(&networks).await;
    analyzer.close();
    println!("\n{}", outcome?);
    Ok(())
}

async fn track_motion(service: &ConfigService, args: TrackArgs) -> AppResult<()> {
    let stack = stack_for(service)?;
    let detector = stack.provider.acquire_motion()?;
    info!(seconds = args.seconds, "Tracking motion");

    detector.start_detection(Arc::new(|motions: &[String]| {
        println!("Detected motions: {}", motions.join(", "));
    }));
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {}
        _ = tokio::signal::ctrl_c() => eprintln!("Stopped."),
    }
    detector.stop_detection();

    println!("\n{}", detector.history().unwrap_or_else(|| NO_MOTION_RESULTS.to_string()));
    Ok(())
}

fn history(service: &ConfigService, args: HistoryArgs) -> AppResult<()> {
    let stack = stack_for(service)?;

    if args.clear {
        let motion = stack.motion_store.clear()?;
        let location = stack.location_store.clear()?;
        println!(
            "Motion history {}, location response {}",
            if motion { "cleared" } else { "already empty" },
            if location { "cleared" } else { "already empty" }
        );
        return Ok(());
    }

    let result = stack.aggregator().aggregate();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result);
    }
    Ok(())
}

fn config(service: &mut ConfigService, args: ConfigArgs) -> AppResult<()> {
    if args.reset {
        service.reset()?;
    }

    let update = SettingsUpdate {
        motion_duration_ms: args.motion_duration_ms,
        fusion_history_chars: args.fusion_chars,
        fusion_mode: args.fusion,
        model: args.model,
        base_url: args.base_url,
        data_dir: args.data_dir,
        ..Default::default()
    };
    let changed = update.motion_duration_ms.is_some()
        || update.fusion_history_chars.is_some()
        || update.fusion_mode.is_some()
        || update.model.is_some()
        || update.base_url.is_some()
        || update.data_dir.is_some();
    if changed {
        service.update_config(update)?;
    }

    println!("# {}", service.path().display());
    println!("{}", serde_json::to_string_pretty(service.get_config())?);
    Ok(())
}
