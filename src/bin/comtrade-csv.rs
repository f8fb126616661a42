use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use comtrade::{timestamps, ComtradeRecord, DataFile, Header};
use log::{debug, info};

/// Time format of the exported axis
const AXIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Parser, Debug)]
#[command(
    name = "comtrade-csv",
    version = env!("CARGO_PKG_VERSION"),
    about = "Export one analog channel of a COMTRADE record to CSV",
    long_about = None,
)]
struct Cli {
    /// Path to the .cfg header file
    #[arg(short, long)]
    file: PathBuf,
    /// Analog channel number, as in the header (from 1)
    #[arg(short, long, default_value = "1")]
    channel: usize,
    /// Print the analog channel names and exit
    #[arg(short, long)]
    detail: bool,
    /// Output CSV path (default: header path with .csv extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// 查找同名的 .dat 或 .DAT 数据文件
fn locate_data_file(cfg: &Path) -> Option<PathBuf> {
    ["dat", "DAT"]
        .iter()
        .map(|ext| cfg.with_extension(ext))
        .find(|p| p.exists())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut bytes = Vec::new();
    File::open(&cli.file)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .with_context(|| format!("cannot read header {}", cli.file.display()))?;
    let header = Header::parse(&bytes)
        .with_context(|| format!("invalid header {}", cli.file.display()))?;

    if cli.detail {
        println!("{}", header.analog_channel_names().join(", "));
        return Ok(());
    }

    let Some(dat_path) = locate_data_file(&cli.file) else {
        bail!("data file not found next to {}", cli.file.display());
    };
    debug!("using data file {}", dat_path.display());
    let dat = File::open(&dat_path)
        .with_context(|| format!("cannot open data file {}", dat_path.display()))?;

    let record = ComtradeRecord::new(header, DataFile::from_reader(dat)?);
    let values = record.channel_series(cli.channel)?;
    let axis = timestamps(record.header())?;

    let output = cli
        .output
        .unwrap_or_else(|| cli.file.with_extension("csv"));
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("cannot create {}", output.display()))?;
    for (t, y) in axis.iter().zip(&values) {
        writer.write_record([t.format(AXIS_FORMAT).to_string(), y.to_string()])?;
    }
    writer.flush()?;

    info!(
        "wrote {} samples of channel {} to {}",
        values.len(),
        cli.channel,
        output.display()
    );
    Ok(())
}
