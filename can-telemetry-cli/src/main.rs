//! CAN Telemetry Monitor CLI
//!
//! Reads frames from a SocketCAN interface (or a candump recording), feeds
//! them through the can-telemetry-decoder library and renders what it
//! observes: periodic snapshot log lines, switch transitions, tire pressure
//! advisories and unknown identifiers.

use anyhow::{Context, Result};
use can_telemetry_decoder::{
    Decoder, FloatChannel, FrameId, IntChannel, MonitorConfig,
};
use clap::Parser;
use std::path::PathBuf;

mod config;
mod output;
mod transport;

use config::{AppConfig, OutputFormat};

/// CAN Telemetry Monitor - Decode live vehicle CAN traffic
#[derive(Parser, Debug)]
#[command(name = "can-telemetry")]
#[command(about = "Decode vehicle CAN traffic into telemetry channels", long_about = None)]
#[command(version)]
struct Args {
    /// CAN interface to listen on
    #[arg(value_name = "IFNAME", default_value = "can0", conflicts_with = "replay")]
    interface: String,

    /// Replay a candump log instead of opening an interface ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Stop after this many frames
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<u64>,

    /// Steering angle (degrees) above which tire checks are skipped
    #[arg(long, value_name = "DEG")]
    steering_limit: Option<i32>,

    /// Counter value at which a tire pressure advisory is raised
    #[arg(long, value_name = "COUNT")]
    alert_threshold: Option<i32>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Telemetry Monitor v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_telemetry_decoder::VERSION);
    log::info!(
        "{} known frame IDs, {} float channels, {} int channels",
        FrameId::ALL.len(),
        FloatChannel::COUNT,
        IntChannel::COUNT
    );
    log::info!("Started at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"));

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let monitor = apply_overrides(app_config.monitor, &args);
    let format = args.format.unwrap_or(app_config.output.format);
    log::debug!("Monitor settings: {:?}", monitor);

    let mut decoder = Decoder::with_config(monitor).context("Invalid monitor settings")?;
    let mut presenter = output::presenter_for(format);

    let source = match &args.replay {
        Some(path) => transport::open_replay(path)?,
        None => transport::open_interface(&args.interface)?,
    };

    let result = decoder.run(source, &mut presenter, args.max_frames);
    print_summary(&decoder);

    result.context("Decoding stopped")?;
    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(mut monitor: MonitorConfig, args: &Args) -> MonitorConfig {
    if let Some(limit) = args.steering_limit {
        monitor = monitor.with_steering_limit(limit);
    }
    if let Some(threshold) = args.alert_threshold {
        monitor = monitor.with_alert_threshold(threshold);
    }
    monitor
}

fn print_summary(decoder: &Decoder) {
    let stats = decoder.stats();
    log::info!(
        "Processed {} frames: {} recognized, {} unrecognized, {} rejected, {} snapshots",
        stats.frames,
        stats.recognized,
        stats.unrecognized,
        stats.rejected,
        stats.snapshots
    );

    let unknown = decoder.unknown_frames();
    if !unknown.is_empty() {
        let ids: Vec<String> = unknown.ids().iter().map(|id| format!("0x{:03X}", id)).collect();
        log::info!("Unknown CAN IDs ({}): {}", unknown.len(), ids.join(" "));
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "can-telemetry",
            "--replay",
            "drive.log",
            "--steering-limit",
            "20",
            "--alert-threshold",
            "50",
            "--format",
            "json",
        ]);
        assert_eq!(args.format, Some(OutputFormat::Json));

        let monitor = apply_overrides(MonitorConfig::default(), &args);
        assert_eq!(monitor.steering_limit_deg, 20);
        assert_eq!(monitor.alert_threshold, 50);
        assert_eq!(monitor.skew_ratio, MonitorConfig::default().skew_ratio);
    }

    #[test]
    fn test_default_interface() {
        let args = Args::parse_from(["can-telemetry"]);
        assert_eq!(args.interface, "can0");
        assert!(args.replay.is_none());
        assert_eq!(args.verbose, 0);
    }
}
