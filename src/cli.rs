use crate::config::{Algorithm, OfcConfig, WaitMode};
use crate::error::OfcError;
use crate::session;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = "Overlapped File Compressor (OFC)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compresses a file
    Compress {
        /// Input file to compress
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file name (default: input path plus the codec extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Compression algorithm [lz4, zstd]
        #[arg(short, long, default_value = "lz4")]
        algorithm: Algorithm,

        /// Chunk size in bytes
        #[arg(short, long)]
        chunk_size: Option<usize>,

        /// Compression level (zstd only)
        #[arg(short, long)]
        level: Option<i32>,

        /// Wait for each chunk write instead of overlapping it with the
        /// next read
        #[arg(long)]
        blocking: bool,
    },
}

/// Default output path: the input name with the codec extension appended.
/// Existing files are overwritten.
fn default_output_path(input: &Path, algorithm: Algorithm) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(algorithm.extension());
    PathBuf::from(name)
}

pub fn run() -> Result<(), OfcError> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Compress {
            input,
            output,
            algorithm,
            chunk_size,
            level,
            blocking,
        } => {
            let output = output
                .clone()
                .unwrap_or_else(|| default_output_path(input, *algorithm));
            println!("Compressing {} to {}...", input.display(), output.display());

            let mut config = OfcConfig::default().with_algorithm(*algorithm);
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = *chunk_size;
            }
            if let Some(level) = level {
                config.level = *level;
            }
            if *blocking {
                config.wait_mode = WaitMode::Blocking;
            }
            config.progress = true;

            let start = Instant::now();
            let stats = session::compress(input, &output, &config)?;
            let duration = start.elapsed();

            println!("Compression successful!");
            println!("  Original Size:    {} bytes", stats.original_size);
            println!("  Compressed Size:  {} bytes", stats.compressed_size);
            println!("  Ratio:            {:.2}x", stats.ratio);
            println!("  Elapsed Time:     {:.2?}", duration);
        }
    }

    Ok(())
}
