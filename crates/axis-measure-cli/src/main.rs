//! `axis-measure`: command-line interface for the AXIS measurement IP.
//!
//! ```text
//! USAGE:
//!   axis-measure list                          List UIO devices
//!   axis-measure --uio NAME status             Control state and counters
//!   axis-measure --uio NAME run --duration-ms 500
//!   axis-measure --pcie 0000:65:00.1 --bar 2 --base 0x10000 counters
//!   axis-measure --software run                Simulated IP, no hardware
//! ```
//!
//! `--mhz` and `--width` (or `AXIS_MEASURE_CLOCK_MHZ` /
//! `AXIS_MEASURE_WIDTH_BYTES`) avoid the destructive clock estimate and the
//! width register.

use anyhow::{Context, Result};
use axis_measure_driver::discovery::{UIO_DEV_ROOT, UIO_SYSFS_ROOT};
use axis_measure_driver::metrics::{self, Measurement};
use axis_measure_driver::{AxisMeasureKernel, BackendSelection, MeasureConfig};
use clap::{Args, Parser, Subcommand};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "axis-measure", about = "AXIS measurement IP CLI", version)]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Args)]
struct Target {
    /// UIO instance name of the IP (e.g. axis_measure_0).
    #[arg(long, global = true)]
    uio: Option<String>,

    /// PCIe address of the card holding the IP (e.g. 0000:65:00.1).
    #[arg(long, global = true)]
    pcie: Option<String>,

    /// BAR index for --pcie.
    #[arg(long, global = true, default_value_t = 0)]
    bar: usize,

    /// Byte offset of the IP inside the BAR for --pcie.
    #[arg(long, global = true, default_value = "0", value_parser = parse_u64)]
    base: u64,

    /// Use the simulated IP.
    #[arg(long, global = true)]
    software: bool,

    /// Known stream clock in MHz (skips the destructive estimate).
    #[arg(long, global = true, alias = "clock-mhz")]
    mhz: Option<f64>,

    /// Known stream width in bytes (skips the width register).
    #[arg(long, global = true)]
    width: Option<u32>,
}

#[derive(Subcommand)]
enum Cmd {
    /// List UIO devices and their names.
    List,
    /// Start counting.
    Start,
    /// Stop counting.
    Stop,
    /// Clear the counters (also stops).
    Clear,
    /// Show control state, data width and counters.
    Status,
    /// Print the three 64-bit counters.
    Counters,
    /// Read one register.
    Read {
        /// Byte offset (decimal or 0x-prefixed hex).
        #[arg(value_parser = parse_u32)]
        offset: u32,
    },
    /// Write one register.
    Write {
        /// Byte offset (decimal or 0x-prefixed hex).
        #[arg(value_parser = parse_u32)]
        offset: u32,
        /// Value (decimal or 0x-prefixed hex).
        #[arg(value_parser = parse_u32)]
        value: u32,
    },
    /// Dump the last captured beat.
    Frame,
    /// Throughput of the current counters in MB/s.
    Mbps,
    /// Estimate the stream clock (clears the counters).
    EstimateClock {
        /// Counting window in milliseconds.
        #[arg(long, default_value_t = 1000)]
        window_ms: u64,
    },
    /// Sample beats per cycle at a fixed interval.
    Sample {
        /// Interval between samples in microseconds.
        #[arg(long, default_value_t = 100_000)]
        interval_us: u64,
        /// Number of samples.
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Clear, count for a while, stop, and report.
    Run {
        /// Counting duration in milliseconds.
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let Cli { target, command } = Cli::parse();

    match command {
        Cmd::List => cmd_list()?,
        Cmd::Start => open_ip(&target)?.start_measurement()?,
        Cmd::Stop => open_ip(&target)?.stop_measurement()?,
        Cmd::Clear => open_ip(&target)?.clear_and_stop_measurement()?,
        Cmd::Status => cmd_status(&open_ip(&target)?)?,
        Cmd::Counters => print_measurement(&open_ip(&target)?.snapshot()?, None, None),
        Cmd::Read { offset } => {
            println!("{offset:#06x}: {:#010x}", open_ip(&target)?.read(offset)?);
        }
        Cmd::Write { offset, value } => open_ip(&target)?.write(offset, value)?,
        Cmd::Frame => cmd_frame(&open_ip(&target)?)?,
        Cmd::Mbps => println!("{:.3} MB/s", open_ip(&target)?.mbps()?),
        Cmd::EstimateClock { window_ms } => {
            let mut ip = open_ip(&target)?;
            let config = ip
                .config()
                .clone()
                .with_estimate_window(Duration::from_millis(window_ms))?;
            ip.set_config(config);
            println!("{:.3} MHz (estimate)", ip.estimate_clock_mhz()?);
        }
        Cmd::Sample { interval_us, count } => {
            let ip = open_ip(&target)?;
            for (i, rate) in ip
                .asserts_in_interval(Duration::from_micros(interval_us), count)?
                .iter()
                .enumerate()
            {
                println!("[{i:>4}] {rate:.6} beats/cycle");
            }
        }
        Cmd::Run { duration_ms } => cmd_run(&mut open_ip(&target)?, duration_ms)?,
    }

    Ok(())
}

fn open_ip(target: &Target) -> Result<AxisMeasureKernel> {
    let config = build_config(target)?;
    let selection = selection(target)?;
    AxisMeasureKernel::open(&selection, config)
        .with_context(|| format!("Cannot open {selection:?}"))
}

fn build_config(target: &Target) -> Result<MeasureConfig> {
    let mut config = MeasureConfig::from_env()?;
    if let Some(mhz) = target.mhz {
        config = config.with_clock_mhz(mhz)?;
    }
    if let Some(width) = target.width {
        config = config.with_axis_width_bytes(width)?;
    }
    Ok(config)
}

fn selection(target: &Target) -> Result<BackendSelection> {
    if target.software {
        return Ok(BackendSelection::Software);
    }
    if let Some(address) = &target.pcie {
        return Ok(BackendSelection::PcieBar {
            address: address.clone(),
            bar: target.bar,
            base: usize::try_from(target.base).context("--base does not fit in usize")?,
        });
    }
    if let Some(name) = &target.uio {
        return Ok(BackendSelection::Uio { name: name.clone() });
    }
    anyhow::bail!("no target: pass --uio NAME, --pcie ADDR or --software")
}

fn cmd_list() -> Result<()> {
    let devices = axis_measure_driver::list_uio(Path::new(UIO_SYSFS_ROOT), Path::new(UIO_DEV_ROOT))
        .context("Cannot read UIO sysfs tree")?;

    println!("UIO devices: {}", devices.len());
    for dev in devices {
        let addr = dev
            .addr
            .map_or_else(|| "?".to_string(), |a| format!("{a:#x}"));
        println!(
            "  uio{:<3} {:<32} addr {}  size {:#x}",
            dev.index, dev.name, addr, dev.map_size
        );
    }
    Ok(())
}

fn cmd_status(ip: &AxisMeasureKernel) -> Result<()> {
    println!("Backend      : {}", ip.backend().backend_type());
    println!("Control      : {}", ip.control_state()?);
    println!("Data width   : {} bytes", ip.axis_width_bytes()?);
    print_measurement(&ip.snapshot()?, ip.config().clock_mhz, None);
    Ok(())
}

fn cmd_frame(ip: &AxisMeasureKernel) -> Result<()> {
    let width = ip.effective_width_bytes()?;
    let words = ip.last_frame(width)?;
    println!("Last frame ({width} bytes, {} words):", words.len());
    for (i, word) in words.iter().enumerate() {
        println!("  [{i:>2}] {word:#010x}");
    }
    Ok(())
}

fn cmd_run(ip: &mut AxisMeasureKernel, duration_ms: u64) -> Result<()> {
    let m = ip.run_for(Duration::from_millis(duration_ms))?;
    let width = ip.effective_width_bytes()?;
    let mhz = ip.clock_mhz()?;
    print_measurement(&m, Some(mhz), Some(width));
    Ok(())
}

fn print_measurement(m: &Measurement, mhz: Option<f64>, width: Option<u32>) {
    println!("Assertions   : {}", m.assertions);
    println!("Cycles       : {}", m.cycles);
    println!("Latency      : {} cycles", m.latency);

    match m.assertions_per_cycle() {
        Ok(rate) => println!("Beats/cycle  : {rate:.6} ({:.2}% busy)", rate * 100.0),
        Err(_) => println!("Beats/cycle  : (no cycles counted)"),
    }

    let Some(mhz) = mhz else { return };
    println!("Clock        : {mhz:.3} MHz");
    if let Ok(s) = m.seconds(mhz) {
        println!("Elapsed      : {:.6} s", s);
    }
    if let Ok(ns) = m.latency_ns(mhz) {
        println!("Latency      : {ns:.1} ns");
    }
    if let Some(width) = width {
        println!(
            "Transferred  : {:.3} MB",
            metrics::megabytes(m.bytes_transferred(width))
        );
        match m.mbps(mhz, width) {
            Ok(mbps) => println!("Throughput   : {mbps:.3} MB/s"),
            Err(e) => println!("Throughput   : ({e})"),
        }
    }
}

fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    u32::try_from(parse_u64(s)?).map_err(|_| format!("{s} does not fit in 32 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_u32("0x2c"), Ok(0x2c));
        assert_eq!(parse_u32("44"), Ok(44));
        assert!(parse_u32("0x1_0000_0000").is_err());
        assert!(parse_u32("0x100000000").is_err());
    }

    #[test]
    fn target_precedence() {
        let cli = Cli::parse_from(["axis-measure", "--uio", "ip0", "--software", "status"]);
        assert_eq!(selection(&cli.target).unwrap(), BackendSelection::Software);

        let cli = Cli::parse_from([
            "axis-measure", "--pcie", "0000:65:00.1", "--bar", "2", "--base", "0x10000", "counters",
        ]);
        assert_eq!(
            selection(&cli.target).unwrap(),
            BackendSelection::PcieBar {
                address: "0000:65:00.1".into(),
                bar: 2,
                base: 0x10000,
            }
        );

        let cli = Cli::parse_from(["axis-measure", "status"]);
        assert!(selection(&cli.target).is_err());
    }

    #[test]
    fn run_against_software_ip() {
        let cli = Cli::parse_from(["axis-measure", "--software", "--mhz", "300", "run"]);
        let config = build_config(&cli.target).unwrap();
        assert_eq!(config.clock_mhz, Some(300.0));
        let mut ip = AxisMeasureKernel::open(&selection(&cli.target).unwrap(), config).unwrap();
        cmd_run(&mut ip, 5).unwrap();
    }

    #[test]
    fn clock_and_width_flags_after_subcommand() {
        let cli = Cli::parse_from(["axis-measure", "--software", "mbps", "--mhz", "250", "--width", "32"]);
        assert!(matches!(cli.command, Cmd::Mbps));
        assert_eq!(cli.target.mhz, Some(250.0));
        assert_eq!(cli.target.width, Some(32));

        let cli = Cli::parse_from(["axis-measure", "--clock-mhz", "125", "--software", "frame"]);
        assert_eq!(cli.target.mhz, Some(125.0));
    }

    #[test]
    fn list_needs_no_target() {
        let cli = Cli::parse_from(["axis-measure", "list"]);
        assert!(matches!(cli.command, Cmd::List));
        assert!(selection(&cli.target).is_err());
    }

    #[test]
    fn every_device_command_opens_the_target() {
        let cli = Cli::parse_from(["axis-measure", "--software", "--width", "16", "frame"]);
        let ip = open_ip(&cli.target).unwrap();
        assert_eq!(ip.effective_width_bytes().unwrap(), 16);
        cmd_frame(&ip).unwrap();
    }
}
