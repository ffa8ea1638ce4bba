//! Session construction and the public compress entry point.
//!
//! The factory opens both files, sizes the codec buffers from the input
//! size and chunk size, picks the output channel backend matching the
//! wait mode, and hands control to the pipeline driver. Everything is
//! owned by the session, so handles, buffers and the codec context are
//! released on every exit path when it drops.

use crate::channel::{BlockingChannel, Channel, OverlappedChannel};
use crate::codec::CodecAdapter;
use crate::config::{OfcConfig, WaitMode};
use crate::driver::PipelineDriver;
use crate::error::Result;
use std::path::Path;

#[derive(Debug)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    pub ratio: f64,
}

/// Compress `input` into `output` with the configured codec.
///
/// The input is opened first: an unreadable input path fails before the
/// output file is ever created. On failure the partially written output
/// is left in place and must be treated as garbage.
pub fn compress(input: &Path, output: &Path, config: &OfcConfig) -> Result<CompressionStats> {
    config.validate()?;

    let reader = BlockingChannel::open_for_read(input)?;
    let file_size = reader.file_size()?;
    let total_chunks = file_size.div_ceil(config.chunk_size as u64);

    let codec = CodecAdapter::for_config(config)?;

    let writer: Box<dyn Channel> = match config.wait_mode {
        WaitMode::Blocking => Box::new(BlockingChannel::open_for_write(output)?),
        WaitMode::Overlapped => Box::new(OverlappedChannel::open_for_write(output)?),
    };

    log::debug!(
        "compressing {} ({} bytes, {} chunks of {})",
        input.display(),
        file_size,
        total_chunks,
        config.chunk_size
    );

    let mut driver = PipelineDriver::new(
        Box::new(reader),
        writer,
        codec,
        config.chunk_size,
        total_chunks,
        config.wait_mode,
    );
    if config.progress {
        driver = driver.with_progress(file_size);
    }

    driver.execute()?;

    let original_size = driver.bytes_read();
    let compressed_size = driver.bytes_written();
    let ratio = if compressed_size > 0 {
        original_size as f64 / compressed_size as f64
    } else {
        0.0
    };

    Ok(CompressionStats {
        original_size,
        compressed_size,
        ratio,
    })
}
