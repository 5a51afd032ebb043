//! dymo-scale reader
//!
//! Opens the Dymo USB scale attached to this host and prints weight reports
//! (or raw endpoint packets) from it.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use common::{UsbBackend, setup_logging};
use config::{OutputFormat, ReaderConfig, ReaderSettings};
use protocol::Measurement;
use scale::{RawPacket, ScaleSession};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "dymo-scale")]
#[command(author, version, about = "Read weights from a Dymo USB scale")]
#[command(long_about = "
Reads weight reports from the single Dymo USB scale attached to this host.
Exactly one scale must be connected.

EXAMPLES:
    # Take one reading
    dymo-scale

    # Stream readings as JSON lines until interrupted
    dymo-scale --count 0 --json

    # Dump raw endpoint packets
    dymo-scale --raw --count 5

CONFIGURATION:
    The reader looks for configuration in the following order:
    1. Path specified with --config
    2. ~/.config/dymo-scale/reader.toml
    3. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Number of readings to take (0 = until interrupted)
    #[arg(short = 'n', long, value_name = "N")]
    count: Option<u64>,

    /// Pause between readings in milliseconds
    #[arg(short, long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Print readings as JSON lines
    #[arg(long)]
    json: bool,

    /// Print raw endpoint packets instead of decoded readings
    #[arg(long)]
    raw: bool,
}

impl Args {
    /// Apply command-line overrides on top of file settings
    fn apply(&self, mut settings: ReaderSettings) -> ReaderSettings {
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(count) = self.count {
            settings.count = count;
        }
        if let Some(interval) = self.interval_ms {
            settings.interval_ms = interval;
        }
        if self.json {
            settings.output = OutputFormat::Json;
        }
        settings
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = ReaderConfig::default();
        let path = ReaderConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = match args.config.as_deref() {
        Some(path) => ReaderConfig::load(Some(config::expand_path(path))),
        None => ReaderConfig::load_or_default(),
    }
    .context("Failed to load configuration")?;

    let settings = args.apply(config.reader);
    config::validate_log_level(&settings.log_level)?;
    setup_logging(&settings.log_level).context("Failed to setup logging")?;

    info!("dymo-scale v{}", env!("CARGO_PKG_VERSION"));
    debug!("Reader settings: {:?}", settings);

    let mut session = ScaleSession::open().context("Failed to open Dymo scale")?;
    let summary = session.device_summary();
    info!(
        "Opened scale {:04x}:{:04x} on bus {:03} device {:03}",
        summary.vendor_id, summary.product_id, summary.bus_number, summary.address
    );

    let stdout = io::stdout();
    let result = take_readings(&mut session, &settings, args.raw, &mut stdout.lock());

    // Close even when reading failed; a read error takes precedence.
    let closed = session.close().context("Failed to close Dymo scale");
    result?;
    closed
}

/// Take `settings.count` readings and print each one to `out`
fn take_readings<B: UsbBackend, W: Write>(
    session: &mut ScaleSession<B>,
    settings: &ReaderSettings,
    raw: bool,
    out: &mut W,
) -> Result<()> {
    let mut taken = 0u64;

    loop {
        let line = if raw {
            let packet = session.read_raw().context("Failed to read from scale")?;
            format_raw(&packet)
        } else {
            let measurement = session
                .read_measurement()
                .context("Failed to read measurement")?;
            format_measurement(&measurement, settings.output)?
        };
        writeln!(out, "{}", line)?;
        out.flush()?;

        taken += 1;
        if settings.count != 0 && taken >= settings.count {
            break;
        }
        if settings.interval_ms > 0 {
            thread::sleep(Duration::from_millis(settings.interval_ms));
        }
    }

    debug!("Took {} reading(s)", taken);
    Ok(())
}

fn format_measurement(measurement: &Measurement, output: OutputFormat) -> Result<String> {
    Ok(match output {
        OutputFormat::Text => measurement.to_string(),
        OutputFormat::Json => {
            serde_json::to_string(measurement).context("Failed to serialize measurement")?
        }
    })
}

/// Hex dump of the populated part of a raw packet
fn format_raw(packet: &RawPacket) -> String {
    let bytes: Vec<String> = packet.data().iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{} ({} of {} bytes)",
        bytes.join(" "),
        packet.bytes_read,
        packet.buffer.len()
    )
}
