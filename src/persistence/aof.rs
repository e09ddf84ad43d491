//! Append-Only File
//!
//! Every accepted write command is re-encoded in request form and appended to
//! an in-memory buffer. The event loop calls [`AppendOnlyLog::tick`] once per
//! iteration, which writes the buffer out at most every `flush_interval` and
//! syncs the file according to the [`FsyncPolicy`].
//!
//! ## Durability Window
//!
//! ```text
//!  execute()          tick() every loop iteration
//!     │                    │
//!     ▼                    ▼
//! ┌─────────┐  ≥100ms  ┌────────┐  policy  ┌────────┐
//! │ pending │ ───────> │ kernel │ ───────> │  disk  │
//! └─────────┘  write   └────────┘  fsync   └────────┘
//! ```
//!
//! With the default `EverySec` policy a crash loses at most the last flush
//! interval of writes plus roughly one second of unsynced data.
//!
//! ## Recovery
//!
//! The file is a header-less concatenation of request frames. On startup it
//! is read back in full and every frame is executed again with appends
//! suppressed. A truncated or corrupt tail stops the replay with a warning
//! and is cut off, so later appends stay readable.

use crate::protocol::{Frame, RespParser};
use bytes::{Buf, BytesMut};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default interval between two writes of the pending buffer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between two syncs under [`FsyncPolicy::EverySec`].
pub const FSYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised by the append-only file.
#[derive(Debug, Error)]
pub enum AofError {
    #[error("failed to open append-only file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("append-only file I/O error: {0}")]
    Io(#[from] io::Error),
}

/// When the log asks the kernel to push written bytes to stable storage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FsyncPolicy {
    /// Sync after every successful flush
    Always,
    /// Sync at most once per second
    #[default]
    EverySec,
    /// Never sync explicitly, leave it to the OS
    No,
}

impl FromStr for FsyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(FsyncPolicy::Always),
            "everysec" => Ok(FsyncPolicy::EverySec),
            "no" => Ok(FsyncPolicy::No),
            _ => Err(format!("invalid fsync policy '{}', expected always, everysec or no", s)),
        }
    }
}

/// Tuning knobs for [`AppendOnlyLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AofConfig {
    /// Minimum time between two writes of the pending buffer
    pub flush_interval: Duration,
    /// Sync policy
    pub fsync: FsyncPolicy,
}

impl Default for AofConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            fsync: FsyncPolicy::default(),
        }
    }
}

/// Result of replaying a log file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Frames parsed and executed
    pub frames: u64,
    /// Bytes covered by those frames
    pub bytes_consumed: u64,
    /// Trailing bytes that did not form a valid frame
    pub bytes_ignored: u64,
}

/// Buffered append-only log of write commands.
#[derive(Debug)]
pub struct AppendOnlyLog {
    file: File,
    path: PathBuf,
    config: AofConfig,
    pending: BytesMut,
    /// Bytes physically written, file length at open included
    written: u64,
    last_flush: Instant,
    last_fsync: Instant,
    replaying: bool,
}

impl AppendOnlyLog {
    /// Opens (or creates) the log at `path` for reading and appending.
    pub fn open(path: impl AsRef<Path>, config: AofConfig) -> Result<Self, AofError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|source| AofError::Open {
                path: path.clone(),
                source,
            })?;
        let log = Self::from_file(file, path, config)?;

        info!(path = %log.path.display(), bytes = log.written, "append-only file opened");
        Ok(log)
    }

    /// Wraps an already opened file; its current length counts as written.
    pub(crate) fn from_file(file: File, path: PathBuf, config: AofConfig) -> io::Result<Self> {
        let written = file.metadata()?.len();
        let now = Instant::now();

        Ok(Self {
            file,
            path,
            config,
            pending: BytesMut::new(),
            written,
            last_flush: now,
            last_fsync: now,
            replaying: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> AofConfig {
        self.config
    }

    /// Queues `frame` for the next flush. Ignored while replaying.
    pub fn append(&mut self, frame: &Frame) {
        if self.replaying {
            return;
        }
        self.pending.reserve(frame.encoded_len());
        frame.encode_into(&mut self.pending);
    }

    /// Periodic maintenance, called once per event loop iteration.
    pub fn tick(&mut self, now: Instant) {
        let mut flushed = false;

        if !self.pending.is_empty()
            && now.saturating_duration_since(self.last_flush) >= self.config.flush_interval
        {
            match self.flush() {
                Ok(()) => flushed = true,
                Err(e) => warn!(
                    path = %self.path.display(),
                    retained = self.pending.len(),
                    "append-only write failed: {}", e
                ),
            }
            self.last_flush = now;
        }

        let sync_due = match self.config.fsync {
            FsyncPolicy::Always => flushed,
            FsyncPolicy::EverySec => {
                now.saturating_duration_since(self.last_fsync) >= FSYNC_INTERVAL
            }
            FsyncPolicy::No => false,
        };

        if sync_due {
            self.sync();
            self.last_fsync = now;
        }
    }

    /// Writes the whole pending buffer to the file.
    ///
    /// On failure the bytes that made it out are dropped from the buffer and
    /// counted; the rest stays queued for the next attempt.
    pub fn flush(&mut self) -> io::Result<()> {
        let before = self.pending.len();
        let result = drain_into(&mut self.file, &mut self.pending);
        let written = before - self.pending.len();
        self.written += written as u64;

        if written > 0 {
            debug!(bytes = written, "append-only buffer flushed");
        }
        result
    }

    /// Asks the OS to persist written data. Failures are logged only.
    pub fn sync(&mut self) {
        if let Err(e) = self.file.sync_data() {
            warn!(path = %self.path.display(), "append-only fsync failed: {}", e);
        }
    }

    /// Bytes written so far plus bytes still queued.
    pub fn bytes(&self) -> u64 {
        self.written + self.pending.len() as u64
    }

    /// Bytes queued but not yet written.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// When the file was last synced (or opened).
    pub fn last_fsync(&self) -> Instant {
        self.last_fsync
    }

    /// Reads the complete file from the start.
    pub fn read_all(&mut self) -> Result<Vec<u8>, AofError> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut data = Vec::with_capacity(self.written as usize);
        self.file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Suppresses appends until [`AppendOnlyLog::end_replay`].
    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    /// Re-enables appends and moves the cursor back to the end of the file.
    pub fn end_replay(&mut self) -> Result<(), AofError> {
        self.replaying = false;
        self.file.seek(SeekFrom::End(0))?;
        Ok(())
    }

    /// Cuts the file down to its first `len` bytes.
    ///
    /// Used after a replay that stopped early, so new appends follow the last
    /// valid frame instead of the unreadable tail. Anything still pending is
    /// unaffected.
    pub fn truncate(&mut self, len: u64) -> Result<(), AofError> {
        if len >= self.written {
            return Ok(());
        }
        warn!(
            path = %self.path.display(),
            valid = len,
            dropped = self.written - len,
            "truncating unreadable tail of append-only file"
        );
        self.file.set_len(len)?;
        self.file.seek(SeekFrom::End(0))?;
        self.written = len;
        Ok(())
    }
}

/// Writes `pending` to `writer` until it is empty, advancing the buffer past
/// every byte accepted. `Interrupted` is retried; any other error stops the
/// attempt and leaves the unwritten tail in `pending`.
pub fn drain_into<W: Write>(writer: &mut W, pending: &mut BytesMut) -> io::Result<()> {
    while !pending.is_empty() {
        match writer.write(pending) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "append-only file accepted no bytes",
                ))
            }
            Ok(n) => pending.advance(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Parses consecutive frames from `data` and hands each one to `apply`.
///
/// Stops at the first incomplete or malformed frame; everything after it is
/// reported as ignored.
pub fn replay_frames<F>(data: &[u8], mut apply: F) -> ReplaySummary
where
    F: FnMut(Frame),
{
    let parser = RespParser::new();
    let mut summary = ReplaySummary::default();
    let mut offset = 0;

    while offset < data.len() {
        match parser.parse(&data[offset..]) {
            Ok(Some((frame, consumed))) => {
                offset += consumed;
                summary.frames += 1;
                apply(frame);
            }
            Ok(None) => {
                warn!(
                    offset,
                    trailing = data.len() - offset,
                    "incomplete frame at end of append-only file, ignoring tail"
                );
                break;
            }
            Err(e) => {
                warn!(offset, "corrupt frame in append-only file, stopping replay: {}", e);
                break;
            }
        }
    }

    summary.bytes_consumed = offset as u64;
    summary.bytes_ignored = (data.len() - offset) as u64;
    summary
}
