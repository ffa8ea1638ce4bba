//! Zstd streaming codec.
//!
//! Continuation-oriented: one `update` pass maps to one
//! `ZSTD_compressStream2` step, so a chunk may take several passes before
//! the input-consumed signal, and the last chunk keeps taking passes in
//! end-of-frame mode until the encoder reports the frame fully drained.
//! Checksums are disabled to match the framing variant.

use super::Emitted;
use crate::error::{OfcError, Result};
use zstd::stream::raw::{CParameter, Encoder, InBuffer, Operation, OutBuffer};

pub struct ZstdStreamCodec {
    src: Box<[u8]>,
    dst: Box<[u8]>,
    encoder: Encoder<'static>,
    /// Position inside the current chunk; reset when the chunk is consumed.
    in_pos: usize,
    began: bool,
    frame_ended: bool,
}

impl ZstdStreamCodec {
    pub fn new(chunk_size: usize, level: i32) -> Result<Self> {
        let dst_cap = zstd::zstd_safe::compress_bound(chunk_size);

        let mut encoder = Encoder::new(level).map_err(|e| OfcError::CodecInit(e.to_string()))?;
        encoder
            .set_parameter(CParameter::ChecksumFlag(false))
            .map_err(|e| OfcError::CodecInit(e.to_string()))?;

        Ok(Self {
            src: vec![0u8; chunk_size].into_boxed_slice(),
            dst: vec![0u8; dst_cap].into_boxed_slice(),
            encoder,
            in_pos: 0,
            began: false,
            frame_ended: false,
        })
    }

    pub fn src_buf(&mut self) -> &mut [u8] {
        &mut self.src
    }

    pub fn dst(&self, len: usize) -> &[u8] {
        &self.dst[..len]
    }

    /// Zstd emits its frame header with the first compressed block, so
    /// begin only arms the lifecycle and emits nothing.
    pub fn begin(&mut self) -> Result<usize> {
        self.began = true;
        Ok(0)
    }

    pub fn update(&mut self, src_len: usize, last: bool) -> Result<Emitted> {
        if !self.began {
            return Err(OfcError::CodecCompress("update before begin".to_string()));
        }
        if self.frame_ended {
            return Err(OfcError::CodecCompress("update after end of frame".to_string()));
        }

        let mut output = OutBuffer::around(&mut self.dst[..]);

        if self.in_pos < src_len {
            let mut input = InBuffer::around(&self.src[..src_len]);
            input.pos = self.in_pos;
            let before = input.pos;

            self.encoder
                .run(&mut input, &mut output)
                .map_err(|e| OfcError::CodecCompress(e.to_string()))?;

            self.in_pos = input.pos;
            let produced = output.pos();
            if produced == 0 && self.in_pos == before {
                return Err(OfcError::CodecCompress(
                    "encoder made no progress on input".to_string(),
                ));
            }

            let consumed = self.in_pos == src_len;
            if consumed && !last {
                self.in_pos = 0;
                return Ok(Emitted {
                    len: produced,
                    finished: true,
                });
            }
            // Last chunk: the end-of-frame drain happens on the next pass.
            return Ok(Emitted {
                len: produced,
                finished: false,
            });
        }

        // Input consumed; drive end-of-frame mode until drained.
        let remaining = self
            .encoder
            .finish(&mut output, true)
            .map_err(|e| OfcError::CodecCompress(e.to_string()))?;
        let produced = output.pos();

        if remaining == 0 {
            self.in_pos = 0;
            self.frame_ended = true;
            return Ok(Emitted {
                len: produced,
                finished: true,
            });
        }
        if produced == 0 {
            return Err(OfcError::CodecCompress(
                "encoder made no progress draining the frame".to_string(),
            ));
        }
        Ok(Emitted {
            len: produced,
            finished: false,
        })
    }

    /// Flush buffered data and the frame epilogue. A no-op when the last
    /// chunk already ended the frame.
    pub fn finalize(&mut self) -> Result<Emitted> {
        if !self.began {
            return Err(OfcError::CodecFinalize("finalize before begin".to_string()));
        }
        if self.frame_ended {
            return Ok(Emitted {
                len: 0,
                finished: true,
            });
        }

        let mut output = OutBuffer::around(&mut self.dst[..]);
        let remaining = self
            .encoder
            .finish(&mut output, true)
            .map_err(|e| OfcError::CodecFinalize(e.to_string()))?;
        let produced = output.pos();

        if remaining == 0 {
            self.frame_ended = true;
            return Ok(Emitted {
                len: produced,
                finished: true,
            });
        }
        if produced == 0 {
            return Err(OfcError::CodecFinalize(
                "encoder made no progress draining the frame".to_string(),
            ));
        }
        Ok(Emitted {
            len: produced,
            finished: false,
        })
    }
}
