use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::ops::ControlFlow;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use dot11parse::config::{Config, OutputConfig, OutputFormat};
use dot11parse::wireless::ieee80211::{FrameBody, ManagementFrame, ParsedFrame};
use dot11parse::wireless::{
    CaptureSession, DecodeStats, Decoded, FrameSource, LiveCapture, PcapFileSource,
};
use dot11parse::MangledCounter;

#[derive(Parser)]
#[command(name = "dot11dump")]
#[command(author, version, about = "Decode 802.11 management and data frames")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Print records as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode frames from a pcap file
    Read {
        /// Capture file (radiotap or bare 802.11 link type)
        file: PathBuf,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Decode frames from a monitor mode interface
    Live {
        /// Interface (default: capture.device from the config)
        device: Option<String>,

        /// Stop after this many records
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Generate default configuration file
    GenConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Table row for the session summary
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: u64,
}

/// Load the config named on the command line, or defaults plus env overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };
    if cli.json {
        config.output.format = OutputFormat::Json;
    }
    Ok(config)
}

pub fn run_command(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Read { file, count } => cmd_read(&config, file, count),
        Commands::Live { device, count } => cmd_live(config, device, count),
        Commands::GenConfig { output } => cmd_gen_config(output),
    }
}

fn cmd_read(config: &Config, file: PathBuf, count: Option<u64>) -> Result<()> {
    let source = PcapFileSource::open(&file)
        .with_context(|| format!("Failed to open capture file {}", file.display()))?;
    decode_all(source, &config.output, count)
}

fn cmd_live(mut config: Config, device: Option<String>, count: Option<u64>) -> Result<()> {
    if let Some(device) = device {
        config.capture.device = device;
    }
    let source = LiveCapture::open(&config.capture)
        .with_context(|| format!("Failed to open {}", config.capture.device))?;
    decode_all(source, &config.output, count)
}

fn decode_all<S: FrameSource>(source: S, output: &OutputConfig, count: Option<u64>) -> Result<()> {
    let mangled = MangledCounter::new();
    let mut session = CaptureSession::open(source, mangled.clone())?;
    let mut printed = 0u64;

    let stats = session.run(|outcome| {
        if let Decoded::Frame(frame) = outcome {
            if output.skip_broadcast && frame.addresses().destination.is_broadcast() {
                return ControlFlow::Continue(());
            }
            match output.format {
                OutputFormat::Text => println!("{}", format_frame(frame)),
                OutputFormat::Json => match serde_json::to_string(frame) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "failed to serialize record"),
                },
            }
            printed += 1;
            if count.is_some_and(|limit| printed >= limit) {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    })?;

    print_summary(&stats, printed, mangled.count(), output.format);
    Ok(())
}

/// One-line text rendering of a record
fn format_frame(frame: &ParsedFrame) -> String {
    let addrs = frame.addresses();
    let mut line = format!(
        "{:<15} {} -> {} bssid {}",
        frame.label().cyan().bold(),
        addrs.source,
        addrs.destination,
        addrs.bssid
    );

    match &frame.body {
        FrameBody::Management(m) => {
            line.push_str(&format!(
                " ssid {} ch {} {}",
                format_ssid(m),
                m.channel,
                security_label(m)
            ));
        }
        FrameBody::Data(d) => line.push_str(&format!(" {:?}", d.ds)),
    }

    if let Some(radio) = frame.radiotap {
        if let Some(signal) = radio.signal_dbm {
            line.push_str(&format!(" {}dBm", signal));
        }
        if let Some(snr) = radio.snr() {
            line.push_str(&format!(" snr {}dB", snr));
        }
    }
    line
}

fn format_ssid(m: &ManagementFrame) -> String {
    if m.is_hidden() {
        "<hidden>".dimmed().to_string()
    } else {
        format!("{:?}", m.ssid)
    }
}

fn security_label(m: &ManagementFrame) -> String {
    match &m.elements.rsn {
        Some(rsn) => {
            let family = if rsn.is_wpa3() {
                "WPA3"
            } else if rsn.is_wpa2() {
                "WPA2"
            } else {
                "RSN"
            };
            let akm: Vec<String> = rsn.akm.iter().map(|s| s.suite.to_string()).collect();
            let pairwise: Vec<String> =
                rsn.pairwise.iter().map(|s| s.suite.to_string()).collect();
            let mut label =
                format!("{} [{}/{}]", family.green(), akm.join(","), pairwise.join(","));
            if rsn.group_cipher.is_legacy() || rsn.pairwise.iter().any(|s| s.suite.is_legacy()) {
                label.push_str(&format!(" {}", "legacy-cipher".yellow()));
            }
            label
        }
        None if m.is_protected() => "WEP".yellow().to_string(),
        None => "open".red().to_string(),
    }
}

fn print_summary(stats: &DecodeStats, printed: u64, mangled: u64, format: OutputFormat) {
    let rows = vec![
        SummaryRow { metric: "Frames", value: stats.frames },
        SummaryRow { metric: "Records", value: stats.records },
        SummaryRow { metric: "Printed", value: printed },
        SummaryRow { metric: "Unhandled", value: stats.unhandled },
        SummaryRow { metric: "Mangled", value: mangled },
        SummaryRow { metric: "Empty polls", value: stats.empty_polls },
    ];

    // Keep stdout machine-readable in JSON mode
    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", Table::new(rows));
        }
        OutputFormat::Json => eprintln!("{}", Table::new(rows)),
    }
}

fn cmd_gen_config(output: Option<PathBuf>) -> Result<()> {
    let toml_str = Config::default_with_comments();

    match output {
        Some(path) => {
            std::fs::write(&path, toml_str)?;
            println!("Configuration written to {}", path.display());
        }
        None => {
            print!("{}", toml_str);
        }
    }

    Ok(())
}
