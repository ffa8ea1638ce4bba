//! LZ4 framing codec.
//!
//! Block-oriented: every `update` pass compresses one whole chunk into a
//! frame block and flushes it, so the driver sees exactly one pass per
//! chunk. Frame settings mirror the classic tool defaults: 64 KB blocks,
//! linked block mode, no checksums.

use super::Emitted;
use crate::error::{OfcError, Result};
use lz4_flex::frame::{BlockMode, BlockSize, FrameEncoder, FrameInfo};
use std::io::Write;

/// Widest possible LZ4 frame header (magic plus full descriptor).
const FRAME_HEADER_MAX: usize = 19;
/// End mark plus slack for anything the encoder appends when closing.
const FRAME_OVERHEAD: usize = 32;

pub struct Lz4FrameCodec {
    src: Box<[u8]>,
    /// Encoder writing into the owned destination Vec; `None` once the
    /// frame has been finished.
    encoder: Option<FrameEncoder<Vec<u8>>>,
    trailer: Vec<u8>,
    began: bool,
}

impl Lz4FrameCodec {
    pub fn new(chunk_size: usize) -> Result<Self> {
        let dst_cap = lz4_flex::block::get_maximum_output_size(chunk_size) + FRAME_OVERHEAD;
        if dst_cap < FRAME_HEADER_MAX {
            return Err(OfcError::CodecInit(
                "destination buffer smaller than a frame header".to_string(),
            ));
        }

        let info = FrameInfo::new()
            .block_size(BlockSize::Max64KB)
            .block_mode(BlockMode::Linked);
        let encoder = FrameEncoder::with_frame_info(info, Vec::with_capacity(dst_cap));

        Ok(Self {
            src: vec![0u8; chunk_size].into_boxed_slice(),
            encoder: Some(encoder),
            trailer: Vec::new(),
            began: false,
        })
    }

    pub fn src_buf(&mut self) -> &mut [u8] {
        &mut self.src
    }

    pub fn dst(&self, len: usize) -> &[u8] {
        match &self.encoder {
            Some(encoder) => &encoder.get_ref()[..len],
            None => &self.trailer[..len],
        }
    }

    /// Emit the frame header.
    pub fn begin(&mut self) -> Result<usize> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| OfcError::CodecInit("begin after finalize".to_string()))?;
        encoder
            .flush()
            .map_err(|e| OfcError::CodecInit(e.to_string()))?;
        self.began = true;
        Ok(encoder.get_ref().len())
    }

    /// Compress one chunk into a frame block. Always finishes in one pass.
    pub fn update(&mut self, src_len: usize, _last: bool) -> Result<Emitted> {
        if !self.began {
            return Err(OfcError::CodecCompress("update before begin".to_string()));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| OfcError::CodecCompress("update after finalize".to_string()))?;

        // The previous pass's output was claimed by the caller once its
        // write was issued; reclaim the buffer slot.
        encoder.get_mut().clear();
        encoder
            .write_all(&self.src[..src_len])
            .map_err(|e| OfcError::CodecCompress(e.to_string()))?;
        encoder
            .flush()
            .map_err(|e| OfcError::CodecCompress(e.to_string()))?;

        Ok(Emitted {
            len: encoder.get_ref().len(),
            finished: true,
        })
    }

    /// End the frame, emitting the end mark.
    pub fn finalize(&mut self) -> Result<Emitted> {
        if let Some(mut encoder) = self.encoder.take() {
            encoder.get_mut().clear();
            self.trailer = encoder
                .finish()
                .map_err(|e| OfcError::CodecFinalize(e.to_string()))?;
        }
        Ok(Emitted {
            len: self.trailer.len(),
            finished: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lz4_flex::frame::FrameDecoder;
    use std::io::Read;

    fn decode(frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        FrameDecoder::new(frame).read_to_end(&mut out).unwrap();
        out
    }

    fn compress_chunks(codec: &mut Lz4FrameCodec, data: &[u8], chunk_size: usize) -> Vec<u8> {
        let mut frame = Vec::new();
        let n = codec.begin().unwrap();
        frame.extend_from_slice(codec.dst(n));

        for chunk in data.chunks(chunk_size) {
            codec.src_buf()[..chunk.len()].copy_from_slice(chunk);
            let step = codec.update(chunk.len(), chunk.len() < chunk_size).unwrap();
            assert!(step.finished);
            frame.extend_from_slice(codec.dst(step.len));
        }

        let step = codec.finalize().unwrap();
        assert!(step.finished);
        frame.extend_from_slice(codec.dst(step.len));
        frame
    }

    #[test]
    fn test_round_trip_multi_chunk() {
        let data: Vec<u8> = (0..10_000u32).flat_map(|x| x.to_le_bytes()).collect();
        let mut codec = Lz4FrameCodec::new(1024).unwrap();
        let frame = compress_chunks(&mut codec, &data, 1024);
        assert_eq!(decode(&frame), data);
    }

    #[test]
    fn test_empty_input_yields_valid_empty_frame() {
        let mut codec = Lz4FrameCodec::new(1024).unwrap();
        let mut frame = Vec::new();
        let n = codec.begin().unwrap();
        frame.extend_from_slice(codec.dst(n));
        let step = codec.finalize().unwrap();
        frame.extend_from_slice(codec.dst(step.len));

        assert!(!frame.is_empty());
        assert_eq!(decode(&frame), Vec::<u8>::new());
    }

    #[test]
    fn test_update_before_begin_is_rejected() {
        let mut codec = Lz4FrameCodec::new(64).unwrap();
        assert!(codec.update(0, true).is_err());
    }

    #[test]
    fn test_tiny_chunk_size() {
        let data = b"abcdefgh".to_vec();
        let mut codec = Lz4FrameCodec::new(1).unwrap();
        let frame = compress_chunks(&mut codec, &data, 1);
        assert_eq!(decode(&frame), data);
    }
}
