//! Handoff CLI binary.
//!
//! Decodes a stream through a worker-thread session, feeding it in bounded
//! pieces the way a network or file reader would.
//!
//! # Commands
//!
//! - `decode` - Decode a file or stdin with a built-in engine
//! - `encode` - Run-length encode a file or stdin

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use handoff::{engine::rle, Config, Decompressor, EngineKind, VERSION};

#[derive(Parser)]
#[command(name = "handoff")]
#[command(version = VERSION)]
#[command(about = "Handoff - drive a pull-based decoder on a worker thread", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode input through a worker-thread session
    Decode {
        /// Input file path (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine (rle, passthrough)
        #[arg(short, long, default_value = "rle")]
        engine: String,

        /// Input bytes handed to the session per feed
        #[arg(long, default_value = "4096")]
        feed_size: usize,

        /// Output bytes requested per decode round (overrides config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Config file path (default: user config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show session statistics
        #[arg(short, long)]
        stats: bool,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run-length encode input
    Encode {
        /// Input file path (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command {
        Commands::Decode {
            file,
            output,
            engine,
            feed_size,
            chunk_size,
            config,
            stats,
            json,
        } => cmd_decode(
            file, output, &engine, feed_size, chunk_size, config, stats, json,
        ),

        Commands::Encode { file, output } => cmd_encode(file, output),
    }
}

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
fn cmd_decode(
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    engine: &str,
    feed_size: usize,
    chunk_size: Option<usize>,
    config_path: Option<PathBuf>,
    stats: bool,
    json: bool,
) -> anyhow::Result<()> {
    let kind: EngineKind = engine.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if feed_size == 0 {
        anyhow::bail!("--feed-size must be non-zero");
    }

    let mut config = match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(size) = chunk_size {
        config.decompressor.chunk_size = size;
    }

    tracing::info!("Decoding with {} engine, feed size {}", kind, feed_size);

    let mut reader = open_input(file)?;
    let mut writer = open_output(output)?;
    let mut decoder = Decompressor::with_config(kind.build(), &config)?;
    let mut buf = vec![0u8; feed_size];

    while !decoder.eof() {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let decoded = decoder.decompress(&buf[..n], None)?;
        writer.write_all(&decoded)?;
    }
    writer.flush()?;

    if !decoder.eof() {
        tracing::warn!("Input ended before end-of-stream marker");
    }

    let summary = decoder.close();
    if json {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    } else if stats {
        eprintln!();
        eprintln!("Session Statistics:");
        eprintln!("  Session:      {}", summary.session_id);
        eprintln!("  State:        {:?}", summary.state);
        eprintln!("  Chunks:       {}", summary.chunks);
        eprintln!("  Workers:      {}", summary.workers_spawned);
        eprintln!("  Resumes:      {}", summary.resumes);
        eprintln!("  Input:        {} bytes", summary.bytes_in);
        eprintln!("  Output:       {} bytes", summary.bytes_out);
        eprintln!("  Expansion:    {:.2}x", summary.expansion_ratio());
    }

    Ok(())
}

fn cmd_encode(file: Option<PathBuf>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut data = Vec::new();
    open_input(file)?.read_to_end(&mut data)?;

    let mut writer = open_output(output)?;
    writer.write_all(&rle::encode(&data))?;
    writer.flush()?;
    Ok(())
}

// Helper functions

fn open_input(file: Option<PathBuf>) -> anyhow::Result<Box<dyn Read>> {
    Ok(match file {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(output: Option<PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(io::BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}
