//! Offset-tracked file channels.
//!
//! A `Channel` wraps one open file and performs positioned reads/writes at
//! offsets the caller tracks through an `OffsetCursor`. Two backends exist:
//! `BlockingChannel` issues plain positioned syscalls, `OverlappedChannel`
//! hands writes to a dedicated I/O worker so the caller can keep reading
//! and compressing while the previous chunk is still being written.

use crate::config::WaitMode;
use crate::error::{OfcError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How long to sleep between polls of an unresolved operation.
const PENDING_BACKOFF: Duration = Duration::from_millis(100);
/// Poll attempts before an unresolved operation becomes a hard error.
const PENDING_RETRIES: u32 = 50;

/// Byte offset at which the next operation on a channel must occur.
///
/// Cursors only ever move forward, by the actual transfer count of the
/// operation that logically precedes them. One cursor per direction; they
/// are never shared.
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetCursor {
    offset: u64,
}

impl OffsetCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn advance(&mut self, bytes: usize) {
        self.offset += bytes as u64;
    }
}

/// Outcome of a write issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The transfer completed; carries the byte count.
    Done(usize),
    /// The transfer was issued overlapped; resolve it with
    /// [`Channel::complete_write`] before issuing the next one.
    Pending,
}

/// Capability contract the pipeline driver depends on.
pub trait Channel {
    /// Read up to `buf.len()` bytes at the cursor offset, blocking until
    /// the count is known. Returns fewer bytes than requested only when
    /// end-of-stream falls inside this chunk; zero means EOF exactly at
    /// the boundary.
    fn read(&mut self, buf: &mut [u8], cursor: &OffsetCursor) -> Result<usize>;

    /// Write `buf` at the cursor offset. With `WaitMode::Blocking` the
    /// call returns `Done` once the full buffer is written; with
    /// `WaitMode::Overlapped` it may return `Pending`.
    fn write(&mut self, buf: &[u8], cursor: &OffsetCursor, wait: WaitMode) -> Result<WriteOutcome>;

    /// Resolve the in-flight write, returning its byte count. Returns 0
    /// when nothing is pending.
    fn complete_write(&mut self) -> Result<usize>;
}

fn open_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| OfcError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn open_write(path: &Path) -> Result<File> {
    // Truncates an existing target, like the original create-always open.
    File::create(path).map_err(|source| OfcError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Positioned read that only reports short when the file actually ends
/// inside the requested range. Transient interruptions retry with a
/// bounded backoff.
fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> Result<usize> {
    let mut filled = 0;
    let mut retries = 0;
    while filled < buf.len() {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                retries = 0;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                retries += 1;
                if retries > PENDING_RETRIES {
                    return Err(OfcError::Io(e));
                }
                log::debug!("read pending at offset {}, backing off", offset);
                thread::sleep(PENDING_BACKOFF);
            }
            Err(e) => return Err(OfcError::Io(e)),
        }
    }
    Ok(filled)
}

/// Blocking-syscall backend: every operation completes before returning.
#[derive(Debug)]
pub struct BlockingChannel {
    file: File,
}

impl BlockingChannel {
    pub fn open_for_read(path: &Path) -> Result<Self> {
        Ok(Self {
            file: open_read(path)?,
        })
    }

    pub fn open_for_write(path: &Path) -> Result<Self> {
        Ok(Self {
            file: open_write(path)?,
        })
    }

    /// Size of the underlying file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.metadata().map_err(OfcError::Io)?.len())
    }
}

impl Channel for BlockingChannel {
    fn read(&mut self, buf: &mut [u8], cursor: &OffsetCursor) -> Result<usize> {
        read_full_at(&self.file, buf, cursor.offset())
    }

    fn write(&mut self, buf: &[u8], cursor: &OffsetCursor, _wait: WaitMode) -> Result<WriteOutcome> {
        self.file
            .write_all_at(buf, cursor.offset())
            .map_err(OfcError::Io)?;
        Ok(WriteOutcome::Done(buf.len()))
    }

    fn complete_write(&mut self) -> Result<usize> {
        Ok(0)
    }
}

struct WriteRequest {
    data: Vec<u8>,
    offset: u64,
}

/// Overlapped backend: writes are serviced by a dedicated worker thread,
/// one in flight at a time. Issuing copies the payload into the request,
/// which is what lets the caller reuse its buffer for the next chunk as
/// soon as the write is issued.
pub struct OverlappedChannel {
    requests: Option<Sender<WriteRequest>>,
    completions: Receiver<io::Result<usize>>,
    worker: Option<thread::JoinHandle<()>>,
    in_flight: bool,
}

impl OverlappedChannel {
    pub fn open_for_write(path: &Path) -> Result<Self> {
        let file = Arc::new(open_write(path)?);
        let (req_tx, req_rx) = bounded::<WriteRequest>(1);
        let (done_tx, done_rx) = bounded::<io::Result<usize>>(1);

        let worker = thread::Builder::new()
            .name("ofc-writer".to_string())
            .spawn(move || {
                for req in req_rx.iter() {
                    let result = file
                        .write_all_at(&req.data, req.offset)
                        .map(|_| req.data.len());
                    if done_tx.send(result).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| OfcError::ResourceExhausted(e.to_string()))?;

        Ok(Self {
            requests: Some(req_tx),
            completions: done_rx,
            worker: Some(worker),
            in_flight: false,
        })
    }

    fn issue(&mut self, buf: &[u8], offset: u64) -> Result<()> {
        let requests = self
            .requests
            .as_ref()
            .expect("write channel alive until drop");
        requests
            .send(WriteRequest {
                data: buf.to_vec(),
                offset,
            })
            .map_err(|_| {
                OfcError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "write worker terminated",
                ))
            })?;
        self.in_flight = true;
        Ok(())
    }

    /// Wait for the in-flight write, polling with a bounded backoff.
    fn wait_completion(&mut self) -> Result<usize> {
        for _ in 0..PENDING_RETRIES {
            match self.completions.recv_timeout(PENDING_BACKOFF) {
                Ok(result) => {
                    self.in_flight = false;
                    return result.map_err(OfcError::Io);
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("write still in progress, backing off");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.in_flight = false;
                    return Err(OfcError::Io(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "write worker terminated",
                    )));
                }
            }
        }
        Err(OfcError::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            "write did not complete within the retry budget",
        )))
    }
}

impl Channel for OverlappedChannel {
    fn read(&mut self, _buf: &mut [u8], _cursor: &OffsetCursor) -> Result<usize> {
        Err(OfcError::Io(io::Error::new(
            io::ErrorKind::Unsupported,
            "channel is write-only",
        )))
    }

    fn write(&mut self, buf: &[u8], cursor: &OffsetCursor, wait: WaitMode) -> Result<WriteOutcome> {
        if self.in_flight {
            return Err(OfcError::Io(io::Error::new(
                io::ErrorKind::Other,
                "write issued while another is in flight",
            )));
        }
        self.issue(buf, cursor.offset())?;
        match wait {
            WaitMode::Blocking => Ok(WriteOutcome::Done(self.wait_completion()?)),
            WaitMode::Overlapped => Ok(WriteOutcome::Pending),
        }
    }

    fn complete_write(&mut self) -> Result<usize> {
        if !self.in_flight {
            return Ok(0);
        }
        self.wait_completion()
    }
}

impl Drop for OverlappedChannel {
    fn drop(&mut self) {
        // Closing the request channel lets the worker drain and exit.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cursor_advances_monotonically() {
        let mut cursor = OffsetCursor::new();
        assert_eq!(cursor.offset(), 0);
        cursor.advance(10);
        cursor.advance(0);
        cursor.advance(7);
        assert_eq!(cursor.offset(), 17);
    }

    #[test]
    fn test_blocking_read_reports_eof_as_short() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let mut channel = BlockingChannel::open_for_read(tmp.path()).unwrap();
        let mut cursor = OffsetCursor::new();
        let mut buf = [0u8; 8];

        let n = channel.read(&mut buf, &cursor).unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buf[..n], b"hello wo");
        cursor.advance(n);

        let n = channel.read(&mut buf, &cursor).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..n], b"rld");
        cursor.advance(n);

        let n = channel.read(&mut buf, &cursor).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_blocking_write_lands_at_cursor_offset() {
        let tmp = NamedTempFile::new().unwrap();
        let mut channel = BlockingChannel::open_for_write(tmp.path()).unwrap();
        let mut cursor = OffsetCursor::new();

        match channel.write(b"abcd", &cursor, WaitMode::Blocking).unwrap() {
            WriteOutcome::Done(n) => cursor.advance(n),
            WriteOutcome::Pending => panic!("blocking write must complete"),
        }
        match channel.write(b"efgh", &cursor, WaitMode::Blocking).unwrap() {
            WriteOutcome::Done(n) => cursor.advance(n),
            WriteOutcome::Pending => panic!("blocking write must complete"),
        }

        assert_eq!(cursor.offset(), 8);
        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"abcdefgh");
    }

    #[test]
    fn test_overlapped_write_completes_later() {
        let tmp = NamedTempFile::new().unwrap();
        let mut channel = OverlappedChannel::open_for_write(tmp.path()).unwrap();
        let mut cursor = OffsetCursor::new();

        let outcome = channel
            .write(b"pipelined", &cursor, WaitMode::Overlapped)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Pending);

        let n = channel.complete_write().unwrap();
        assert_eq!(n, 9);
        cursor.advance(n);

        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"pipelined");
    }

    #[test]
    fn test_overlapped_rejects_double_issue() {
        let tmp = NamedTempFile::new().unwrap();
        let mut channel = OverlappedChannel::open_for_write(tmp.path()).unwrap();
        let cursor = OffsetCursor::new();

        channel
            .write(b"first", &cursor, WaitMode::Overlapped)
            .unwrap();
        assert!(channel.write(b"second", &cursor, WaitMode::Overlapped).is_err());
    }

    #[test]
    fn test_complete_write_without_pending_is_zero() {
        let tmp = NamedTempFile::new().unwrap();
        let mut channel = OverlappedChannel::open_for_write(tmp.path()).unwrap();
        assert_eq!(channel.complete_write().unwrap(), 0);
    }

    #[test]
    fn test_open_missing_input_fails() {
        let err = BlockingChannel::open_for_read(Path::new("/nonexistent/ofc-test")).unwrap_err();
        assert!(matches!(err, OfcError::Open { .. }));
    }
}
