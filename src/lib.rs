//! # OFC (Overlapped File Compressor)
//!
//! Streams a file through an LZ4 or Zstd codec and writes the compressed
//! output to another file, overlapping disk writes with the read and
//! compression of the next chunk instead of serializing the three steps.
//!
//! ## Features
//!
//! - **Pipelined I/O**: the write for chunk N is issued without waiting,
//!   and reconciled while chunk N+1 is already being read and compressed
//! - **Standard output formats**: plain LZ4 frames and Zstd frames,
//!   decodable by any conforming decoder
//! - **Offset-tracked channels**: per-direction cursors make out-of-order
//!   completion impossible to confuse with stream position
//! - **Pluggable codecs**: framing (LZ4) and streaming (Zstd) backends
//!   behind one begin/update/finalize lifecycle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ofc::{session, Algorithm, OfcConfig};
//!
//! let config = OfcConfig::default().with_algorithm(Algorithm::Zstd);
//! let stats = session::compress(
//!     "input.bin".as_ref(),
//!     "input.bin.zst".as_ref(),
//!     &config,
//! ).unwrap();
//! println!("Compression ratio: {:.2}x", stats.ratio);
//! ```

pub mod channel;
pub mod cli;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{Algorithm, OfcConfig, WaitMode};
pub use error::{OfcError, Result};
pub use session::{compress, CompressionStats};

use std::path::Path;

/// Compress a file, reporting success as a plain boolean.
///
/// This is the simple surface for callers that do not care why a run
/// failed; use [`session::compress`] to get the error and the stats. A
/// `false` result means the output file, if it exists, is not
/// trustworthy and should be discarded.
pub fn compress_file(input: &Path, output: &Path, algorithm: Algorithm) -> bool {
    let config = OfcConfig::default().with_algorithm(algorithm);
    match session::compress(input, output, &config) {
        Ok(stats) => {
            log::info!(
                "compressed {} -> {} bytes ({:.2}x)",
                stats.original_size,
                stats.compressed_size,
                stats.ratio
            );
            true
        }
        Err(e) => {
            log::error!("compression failed: {}", e);
            false
        }
    }
}

/// OFC library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
