//! Activity Telemetry Agent CLI.

use activity_telemetry_agent::{
    Agent, Config, InputEventSource, JsonlSink, NoopInputSource, NoopProbe, NoopSampler, VERSION,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "activity-agent")]
#[command(version = VERSION)]
#[command(about = "Background window/process/input activity aggregation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start collecting and aggregating in the foreground
    Start {
        /// Override the capture tick period in seconds
        #[arg(long)]
        collect_secs: Option<u64>,

        /// Override the aggregation period in minutes
        #[arg(long)]
        aggregate_mins: Option<u64>,
    },

    /// Pause data collection
    Pause,

    /// Resume data collection
    Resume,

    /// Show current configuration and export state
    Status,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start {
            collect_secs,
            aggregate_mins,
        } => cmd_start(collect_secs, aggregate_mins),
        Commands::Pause => cmd_set_paused(true),
        Commands::Resume => cmd_set_paused(false),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_start(collect_secs: Option<u64>, aggregate_mins: Option<u64>) -> anyhow::Result<()> {
    println!("Activity Telemetry Agent v{VERSION}");

    let mut config = Config::load().context("loading configuration")?;
    if let Some(secs) = collect_secs {
        config.collect_period_secs = secs;
        config.sample_duration_secs = secs;
    }
    if let Some(mins) = aggregate_mins {
        config.aggregate_period_mins = mins;
    }
    config.ensure_directories().context("creating data directories")?;

    println!("  Collect period: {}s", config.collect_period().as_secs());
    println!(
        "  Aggregate period: {}s",
        config.aggregate_period().as_secs()
    );
    println!("  Export path: {:?}", config.export_path);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Platform window/audio/hook backends are pluggable library traits;
    // this binary ships with the no-op stand-ins.
    let sink = Arc::new(JsonlSink::new(config.export_path.join("aggregates.jsonl")));
    let mut agent = Agent::new(&config, Arc::new(NoopSampler), Arc::new(NoopProbe), sink);
    let mut input_source = NoopInputSource::new(agent.tracker());

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("setting Ctrl+C handler")?;
    }

    // Support pause/resume from another process by polling the config
    // file, so `activity-agent pause` controls a running agent.
    let mut paused = config.paused;
    if paused {
        println!("Collection is currently paused.");
        println!("Run `activity-agent resume` to start collecting.");
    } else {
        input_source
            .start()
            .context("starting input event source")?;
        agent.start().context("starting scheduler")?;
        info!("agent started");
    }

    let mut last_config_check = std::time::Instant::now();
    while running.load(Ordering::SeqCst) {
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(current) = Config::load() {
                if current.paused != paused {
                    paused = current.paused;
                    if paused {
                        info!("pausing collection");
                        agent.stop();
                        input_source.stop();
                    } else {
                        info!("resuming collection");
                        input_source
                            .start()
                            .context("restarting input event source")?;
                        agent.start().context("restarting scheduler")?;
                    }
                }
            }
            last_config_check = std::time::Instant::now();
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!();
    println!("Stopping collection...");
    agent.stop();
    input_source.stop();

    // Flush whatever the last partial cycle buffered.
    match agent.flush() {
        Ok(Some(summary)) => info!(
            windows = summary.windows,
            snapshots = summary.snapshots,
            "final cycle flushed"
        ),
        Ok(None) => info!("nothing buffered at shutdown"),
        Err(e) => warn!(error = %e, "final flush failed; cycle data dropped"),
    }

    Ok(())
}

fn cmd_set_paused(paused: bool) -> anyhow::Result<()> {
    let mut config = Config::load().context("loading configuration")?;
    config.paused = paused;
    config.save().context("saving configuration")?;
    if paused {
        println!("Collection paused. Use 'activity-agent resume' to continue.");
    } else {
        println!("Collection resumed.");
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Activity Telemetry Agent Status");
    println!("===============================");
    println!();
    println!("Configuration:");
    println!("  Collect period: {}s", config.collect_period().as_secs());
    println!("  Aggregate period: {} min", config.aggregate_period_mins);
    println!("  Sample duration: {}s", config.sample_duration_secs);
    println!("  Paused: {}", config.paused);
    println!();

    let export_file = config.export_path.join("aggregates.jsonl");
    if export_file.exists() {
        let batches = std::fs::read_to_string(&export_file)
            .map(|content| content.lines().count())
            .unwrap_or(0);
        println!("Stored batches: {batches} ({export_file:?})");
    } else {
        println!("No aggregate batches stored yet.");
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serializing configuration")?
    );
    Ok(())
}
