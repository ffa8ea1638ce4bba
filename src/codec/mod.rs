//! Codec adapters.
//!
//! Each backend owns a fixed source/destination buffer pair sized at
//! construction and walks the same lifecycle: `begin` emits the frame
//! header, `update` compresses one chunk (pass by pass), `finalize`
//! flushes the trailer. New backends are added as new variants here, not
//! as branches inside the driver.

pub mod lz4;
pub mod zstd;

pub use lz4::Lz4FrameCodec;
pub use zstd::ZstdStreamCodec;

use crate::config::{Algorithm, OfcConfig};
use crate::error::Result;

/// Output of a single codec pass.
///
/// `len` bytes are valid in the destination buffer; `finished` tells the
/// driver whether this operation needs another pass. A framing codec
/// consumes a whole chunk per pass, a streaming codec may not.
#[derive(Debug, Clone, Copy)]
pub struct Emitted {
    pub len: usize,
    pub finished: bool,
}

pub enum CodecAdapter {
    Lz4(Lz4FrameCodec),
    Zstd(ZstdStreamCodec),
}

impl CodecAdapter {
    pub fn for_config(config: &OfcConfig) -> Result<Self> {
        match config.algorithm {
            Algorithm::Lz4 => Ok(CodecAdapter::Lz4(Lz4FrameCodec::new(config.chunk_size)?)),
            Algorithm::Zstd => Ok(CodecAdapter::Zstd(ZstdStreamCodec::new(
                config.chunk_size,
                config.level,
            )?)),
        }
    }

    /// The source buffer one chunk is read into; its length is the
    /// session's chunk size.
    pub fn src_buf(&mut self) -> &mut [u8] {
        match self {
            CodecAdapter::Lz4(c) => c.src_buf(),
            CodecAdapter::Zstd(c) => c.src_buf(),
        }
    }

    /// The first `len` bytes of the destination buffer.
    pub fn dst(&self, len: usize) -> &[u8] {
        match self {
            CodecAdapter::Lz4(c) => c.dst(len),
            CodecAdapter::Zstd(c) => c.dst(len),
        }
    }

    pub fn begin(&mut self) -> Result<usize> {
        match self {
            CodecAdapter::Lz4(c) => c.begin(),
            CodecAdapter::Zstd(c) => c.begin(),
        }
    }

    /// One compression pass over `src_buf[..src_len]`. `last` marks the
    /// final chunk of the stream.
    pub fn update(&mut self, src_len: usize, last: bool) -> Result<Emitted> {
        match self {
            CodecAdapter::Lz4(c) => c.update(src_len, last),
            CodecAdapter::Zstd(c) => c.update(src_len, last),
        }
    }

    /// One trailer-flush pass.
    pub fn finalize(&mut self) -> Result<Emitted> {
        match self {
            CodecAdapter::Lz4(c) => c.finalize(),
            CodecAdapter::Zstd(c) => c.finalize(),
        }
    }
}
