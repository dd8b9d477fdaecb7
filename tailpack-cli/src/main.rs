use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, error, info, warn};

use tailpack::ArchiveWriter;

#[derive(Parser)]
#[command(
    name = "tailpack",
    about = "Pack files into a resource archive for appending to an executable",
    version,
    long_about = "Builds a self-contained resource archive from a list of input files. \
                  The produced file can be concatenated onto any executable; the tailpack \
                  library locates the archive at runtime by scanning backward from \
                  end-of-file."
)]
struct Cli {
    /// Archive file to create
    output: PathBuf,

    /// File listing one input path per line
    filelist: PathBuf,

    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(packed) => {
            info!("wrote {} with {packed} resources", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<usize> {
    let list = File::open(&cli.filelist)
        .with_context(|| format!("opening file list {}", cli.filelist.display()))?;
    let out = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut writer = ArchiveWriter::new(BufWriter::new(out));

    for line in BufReader::new(list).lines() {
        let path = line.context("reading file list")?;
        if path.is_empty() {
            continue;
        }

        // A path that cannot be opened is skipped, never fatal.
        let mut source = match File::open(&path) {
            Ok(f) => f,
            Err(err) => {
                warn!("skipping {path}: {err}");
                continue;
            }
        };
        let len = source
            .metadata()
            .with_context(|| format!("reading metadata of {path}"))?
            .len();
        let size = match u32::try_from(len) {
            Ok(size) => size,
            Err(_) => {
                warn!("skipping {path}: larger than the 4 GiB format limit");
                continue;
            }
        };

        info!("packing {path} ({size} bytes)");
        writer
            .append(&path, size, &mut source)
            .with_context(|| format!("packing {path}"))?;
    }

    let packed = writer.resource_count();
    writer.finish().context("writing archive trailer")?;
    Ok(packed)
}
