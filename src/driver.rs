//! The pipelined chunk loop.
//!
//! One iteration reads a chunk, compresses it, and issues the write for
//! the compressed bytes. With overlapped writes enabled, the write for
//! chunk N is still in flight while chunk N+1 is being read and
//! compressed; its completion is reconciled right before the next write
//! is issued, which is the only point the write cursor may advance for it.

use crate::channel::{Channel, OffsetCursor, WriteOutcome};
use crate::codec::CodecAdapter;
use crate::config::WaitMode;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Created,
    HeaderWritten,
    Running,
    Finalized,
    Failed,
}

pub struct PipelineDriver {
    input: Box<dyn Channel>,
    output: Box<dyn Channel>,
    codec: CodecAdapter,
    read_cursor: OffsetCursor,
    write_cursor: OffsetCursor,
    chunk_size: usize,
    /// Loop bound hint only; termination is driven by short/zero reads.
    total_chunks: u64,
    wait_mode: WaitMode,
    write_pending: bool,
    state: DriverState,
    progress: Option<ProgressBar>,
}

impl PipelineDriver {
    pub fn new(
        input: Box<dyn Channel>,
        output: Box<dyn Channel>,
        codec: CodecAdapter,
        chunk_size: usize,
        total_chunks: u64,
        wait_mode: WaitMode,
    ) -> Self {
        Self {
            input,
            output,
            codec,
            read_cursor: OffsetCursor::new(),
            write_cursor: OffsetCursor::new(),
            chunk_size,
            total_chunks,
            wait_mode,
            write_pending: false,
            state: DriverState::Created,
            progress: None,
        }
    }

    /// Attach a progress bar advanced by bytes read.
    pub fn with_progress(mut self, total_bytes: u64) -> Self {
        let pb = ProgressBar::new(total_bytes);
        pb.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-")
        );
        self.progress = Some(pb);
        self
    }

    /// Total bytes consumed from the input.
    pub fn bytes_read(&self) -> u64 {
        self.read_cursor.offset()
    }

    /// Total bytes landed in the output.
    pub fn bytes_written(&self) -> u64 {
        self.write_cursor.offset()
    }

    /// Run the whole pipeline: header, chunk loop, trailer. Any failure
    /// parks the driver in the failed state; partially written output is
    /// left in place for the caller to discard.
    pub fn execute(&mut self) -> Result<()> {
        let result = self
            .begin()
            .and_then(|_| self.run())
            .and_then(|_| self.finalize());
        if result.is_err() {
            self.state = DriverState::Failed;
            if let Some(pb) = &self.progress {
                pb.abandon();
            }
        }
        result
    }

    /// Created -> HeaderWritten: emit the codec header and write it
    /// synchronously.
    fn begin(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, DriverState::Created);
        let len = self.codec.begin()?;
        self.issue_write(len, WaitMode::Blocking)?;
        self.state = DriverState::HeaderWritten;
        Ok(())
    }

    /// The chunk loop. Reads are always synchronous (compression needs
    /// the bytes); writes follow the session's wait mode.
    fn run(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, DriverState::HeaderWritten);
        self.state = DriverState::Running;

        let mut chunks = 0u64;
        loop {
            let n = self.input.read(self.codec.src_buf(), &self.read_cursor)?;
            self.read_cursor.advance(n);

            if n == 0 {
                // EOF exactly on a chunk boundary: an explicit terminating
                // read rather than trusting the chunk counter.
                log::debug!("eof after {} chunks", chunks);
                break;
            }

            let last = n < self.chunk_size;
            loop {
                let step = self.codec.update(n, last)?;
                if step.len > 0 {
                    self.issue_write(step.len, self.wait_mode)?;
                }
                if step.finished {
                    break;
                }
            }

            chunks += 1;
            if let Some(pb) = &self.progress {
                pb.inc(n as u64);
            }
            if last {
                log::debug!("short read on chunk {} of {}", chunks, self.total_chunks);
                break;
            }
        }
        Ok(())
    }

    /// Running -> Finalized: flush the codec trailer synchronously.
    fn finalize(&mut self) -> Result<()> {
        debug_assert_eq!(self.state, DriverState::Running);
        loop {
            let step = self.codec.finalize()?;
            self.issue_write(step.len, WaitMode::Blocking)?;
            if step.finished {
                break;
            }
        }
        if let Some(pb) = &self.progress {
            pb.finish_with_message("Compression finished");
        }
        self.state = DriverState::Finalized;
        Ok(())
    }

    /// Reconcile the previous overlapped write, then issue the next one.
    ///
    /// The reconcile-first order is the pipelining contract: the write
    /// cursor for chunk N+1 only moves once chunk N's actual transfer
    /// count is known, and the destination buffer is never rewritten
    /// while its bytes have not been handed to the channel.
    fn issue_write(&mut self, len: usize, wait: WaitMode) -> Result<()> {
        if self.write_pending {
            let transferred = self.output.complete_write()?;
            self.write_cursor.advance(transferred);
            self.write_pending = false;
        }
        if len == 0 {
            return Ok(());
        }
        let buf = self.codec.dst(len);
        match self.output.write(buf, &self.write_cursor, wait)? {
            WriteOutcome::Done(transferred) => self.write_cursor.advance(transferred),
            WriteOutcome::Pending => self.write_pending = true,
        }
        Ok(())
    }
}
