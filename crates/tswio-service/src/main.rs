//! tswiod - TSW IO bridge daemon

#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tswio_keystroke::{DisabledKeystrokeSink, KeyCombo, KeystrokeSink, ProcessKeystrokeSink};
use tswio_lever::{LeverAnalyzer, LeverEndpoints, quick_check};
use tswio_service::{
    Bridge, BridgeConfig, InMemoryRepository, Repository, TrainWatcher, init_logging,
};
use tswio_simulator::{HttpSimulatorClient, SimulatorClient};
use tswio_transport::{DeviceTransport, TcpTransport};

#[derive(Parser)]
#[command(name = "tswiod")]
#[command(about = "Bridge between TSW IO control boards and the simulator")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user location)
    #[arg(long, global = true, env = "TSWIO_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge
    Run {
        /// Layout file with devices, trains and bindings
        #[arg(long)]
        layout: PathBuf,

        /// Board to connect to, as host:port. May be repeated.
        #[arg(long = "connect")]
        connect: Vec<String>,
    },

    /// Sweep a lever and suggest its notch table
    Analyze {
        /// Control path, e.g. CurrentDrivableActor/Throttle(Lever)
        #[arg(long)]
        control: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Store the suggested notches in this layout file
        #[arg(long, requires_all = ["train", "element"])]
        layout: Option<PathBuf>,

        #[arg(long)]
        train: Option<String>,

        #[arg(long)]
        element: Option<String>,
    },

    /// Classify a lever from a handful of samples
    QuickCheck {
        #[arg(long)]
        control: String,
    },

    /// Send a key combo through the configured keystroke helper
    Keys {
        /// Combo such as CTRL+SHIFT+F5
        combo: String,
    },

    /// Record a lever sweep and store its calibration
    Calibrate {
        #[arg(long)]
        layout: PathBuf,

        /// Board the input lives on, as host:port
        #[arg(long)]
        connect: String,

        /// Input id to calibrate
        #[arg(long)]
        input: String,

        /// How long to record for
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BridgeConfig::load_from_path(path).await?,
        None => BridgeConfig::load().await?,
    };
    config.validate().context("Invalid configuration")?;

    let mut logging = config.logging.clone().with_verbosity(cli.verbose);
    logging.json |= cli.json_logs;
    init_logging(&logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "tswiod starting");

    match cli.command {
        Commands::Run { layout, connect } => run(config, &layout, &connect).await,
        Commands::Analyze {
            control,
            json,
            layout,
            train,
            element,
        } => {
            let target = match (layout, train, element) {
                (Some(layout), Some(train), Some(element)) => Some((layout, train, element)),
                _ => None,
            };
            analyze(&config, &control, json, target).await
        }
        Commands::QuickCheck { control } => {
            let simulator = simulator(&config).await?;
            let check = quick_check(simulator, &control)
                .await
                .with_context(|| format!("Quick check of {control} failed"))?;
            println!("{}: {:?}", check.control, check.lever_type);
            for sample in &check.samples {
                println!("  {:.2} -> {:.4}", sample.set_input, sample.output);
            }
            Ok(())
        }
        Commands::Keys { combo } => {
            let combo = KeyCombo::parse(&combo)?;
            keystrokes(&config).tap(&combo).await?;
            info!(%combo, "keys sent");
            Ok(())
        }
        Commands::Calibrate {
            layout,
            connect,
            input,
            seconds,
        } => calibrate(config, &layout, &connect, &input, Duration::from_secs(seconds)).await,
    }
}

async fn simulator(config: &BridgeConfig) -> Result<Arc<dyn SimulatorClient>> {
    let client = HttpSimulatorClient::from_settings(&config.simulator)
        .await
        .context("Failed to set up the simulator client")?;
    Ok(Arc::new(client))
}

fn keystrokes(config: &BridgeConfig) -> Arc<dyn KeystrokeSink> {
    match &config.keystroke.helper {
        Some(helper) => Arc::new(ProcessKeystrokeSink::new(helper)),
        None => Arc::new(DisabledKeystrokeSink),
    }
}

async fn connect(addr: &str) -> Result<Arc<dyn DeviceTransport>> {
    let addr = addr.strip_prefix("tcp://").unwrap_or(addr);
    let transport = TcpTransport::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to {addr}"))?;
    Ok(Arc::new(transport))
}

async fn run(config: BridgeConfig, layout: &Path, boards: &[String]) -> Result<()> {
    let repository: Arc<dyn Repository> = Arc::new(
        InMemoryRepository::load(layout)
            .await
            .with_context(|| format!("Failed to load layout {}", layout.display()))?,
    );
    let simulator = simulator(&config).await?;
    let watcher = TrainWatcher::new(
        Arc::clone(&simulator),
        Arc::clone(&repository),
        config.train.detection_path.clone(),
    );
    let keys = keystrokes(&config);
    let bridge = Bridge::new(config, simulator, keys, repository);

    let mut sessions = Vec::new();
    for addr in boards {
        let session = match connect(addr).await {
            Ok(transport) => bridge.connect_device(transport).await,
            Err(e) => Err(e),
        };
        match session {
            Ok(handle) => sessions.push(handle),
            Err(e) => warn!(board = %addr, error = %format!("{e:#}"), "board not connected"),
        }
    }
    info!(boards = sessions.len(), "bridge running");

    bridge
        .run(watcher, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await;

    for session in sessions {
        session.abort();
    }
    Ok(())
}

async fn analyze(
    config: &BridgeConfig,
    control: &str,
    json: bool,
    target: Option<(PathBuf, String, String)>,
) -> Result<()> {
    let analyzer = LeverAnalyzer::new(simulator(config).await?, config.analyzer.clone());
    let report = analyzer
        .analyze(&LeverEndpoints::for_control(control))
        .await
        .with_context(|| format!("Analysis of {control} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {:?}, {} zones, {} notches suggested",
            report.control,
            report.lever_type,
            report.zones.len(),
            report.suggestions.len()
        );
        for notch in report.notches() {
            println!("  {notch:?}");
        }
    }

    if let Some((layout, train, element)) = target {
        let repository = InMemoryRepository::load(&layout).await?;
        repository
            .replace_notches(&train, &element, report.lever_type, report.notches())
            .await?;
        repository.save(&layout).await?;
        info!(
            layout = %layout.display(),
            %train,
            %element,
            lever_type = %report.lever_type,
            "notches stored"
        );
    }
    Ok(())
}

async fn calibrate(
    config: BridgeConfig,
    layout: &Path,
    board: &str,
    input: &str,
    duration: Duration,
) -> Result<()> {
    let repository = Arc::new(InMemoryRepository::load(layout).await?);
    let simulator = simulator(&config).await?;
    let bridge = Bridge::new(
        config,
        simulator,
        Arc::new(DisabledKeystrokeSink),
        Arc::clone(&repository) as Arc<dyn Repository>,
    );
    let session = bridge.connect_device(connect(board).await?).await?;

    bridge.begin_calibration(input);
    tokio::time::sleep(duration).await;
    let calibration = bridge.finish_calibration(input).await?;
    session.abort();

    repository.save(layout).await?;
    println!(
        "{input}: min {} max {}{}{}",
        calibration.min,
        calibration.max,
        if calibration.inverted { ", inverted" } else { "" },
        if calibration.rollover { ", rollover" } else { "" },
    );
    Ok(())
}
