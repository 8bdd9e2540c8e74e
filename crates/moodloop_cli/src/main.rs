use clap::Parser;
use moodloop_core::MoodloopConfig;
use moodloop_limbic::{
    spawn_publisher, AffectDriver, AffectLoop, HeartbeatConfig, JsonLinesSink, SnapshotSink,
    TracingSink,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod input;

use input::LineAction;

#[derive(Parser, Debug)]
#[command(name = "moodloop", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "MOODLOOP_CONFIG", default_value = "moodloop.toml")]
    config: PathBuf,

    /// Stop after this many seconds (default: run until `quit` or Ctrl-C)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Append published snapshots to this file as JSON lines
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Constant perturbation until the first sensor frame arrives
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    perturbation: f64,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Loading config from {}...", args.config.display());
    let config = MoodloopConfig::load_or_default(&args.config)?;

    let mut driver = AffectDriver::from_config(&config)?;
    {
        let schedule = driver.schedule().load();
        info!("Default bundle: {}", schedule.default_params());
        info!("{} schedule window(s)", schedule.len());
        for (idx, line) in schedule.summary().iter().enumerate() {
            info!("  #{} {}", idx, line);
        }
    }
    driver.set_perturbation(args.perturbation);

    let heartbeat = HeartbeatConfig::from(&config.driver);
    let publish_interval = heartbeat.publish_interval;
    let affect_loop = AffectLoop::spawn(driver, heartbeat);

    let mut sinks: Vec<Box<dyn SnapshotSink>> = vec![Box::new(TracingSink)];
    if let Some(path) = &args.telemetry {
        info!("Writing telemetry to {}", path.display());
        sinks.push(Box::new(JsonLinesSink::create(path).await?));
    }
    let publisher = spawn_publisher(affect_loop.subscribe(), sinks, publish_interval);

    let run_for = args
        .duration
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
    let deadline = async move {
        match run_for {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    println!("moodloop running. Keys: l/L lambda, g/G gain, t/T dt, m mode, r reset, k/K treatment; 'imu <deg>', 'u <value>', 'quit'.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Run duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match input::parse_line(&line) {
                    Ok(LineAction::Quit) => break,
                    Ok(LineAction::Send(inputs)) => {
                        for loop_input in inputs {
                            affect_loop.send(loop_input).await?;
                        }
                    }
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    let driver = affect_loop.shutdown().await?;
    publisher.await?;

    let final_snapshot = driver.model().snapshot();
    println!(
        "Stopped after {} ticks, mood {:+.3}",
        driver.tick_count(),
        final_snapshot.mood
    );
    Ok(())
}
