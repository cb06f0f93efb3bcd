//! Run-scoped log sink.
//!
//! Library code only emits `tracing` events. A [`RunLog`] owns the
//! subscriber those events go to for one run and is handed to the
//! [`Driver`](crate::Driver), which makes it the default dispatcher on
//! the rank's thread for the run's duration. No global subscriber is
//! installed, so concurrent runs in one process keep separate logs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::dispatcher::{self, Dispatch};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Where log lines go.
enum Target {
    File(BufWriter<File>),
    Stderr,
    Memory(MemoryLog),
    Discard,
}

/// Shared handle to a [`Target`]; one per [`RunLog`] and its clones.
#[derive(Clone)]
struct SinkWriter {
    target: Arc<Mutex<Target>>,
}

fn poisoned() -> io::Error {
    io::Error::other("log sink lock poisoned")
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut target = self.target.lock().map_err(|_| poisoned())?;
        match &mut *target {
            Target::File(w) => w.write(buf),
            Target::Stderr => io::stderr().write(buf),
            Target::Memory(m) => m.append(buf),
            Target::Discard => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut target = self.target.lock().map_err(|_| poisoned())?;
        match &mut *target {
            Target::File(w) => w.flush(),
            Target::Stderr => io::stderr().flush(),
            Target::Memory(_) | Target::Discard => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// In-memory log capture, readable while and after a run.
#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryLog {
    fn append(&self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().map_err(|_| poisoned())?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// Everything logged so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        match self.bytes.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    /// Captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

/// The log of one run.
///
/// Cloning is cheap; clones write to the same sink, so the ranks of an
/// in-process group can share one log file. Each line carries the
/// emitting thread's name, which identifies the rank.
#[derive(Clone)]
pub struct RunLog {
    dispatch: Dispatch,
    writer: SinkWriter,
}

impl RunLog {
    fn with_target(target: Target, level: Level) -> Self {
        let writer = SinkWriter {
            target: Arc::new(Mutex::new(target)),
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_max_level(level)
            .with_ansi(false)
            .with_target(false)
            .with_thread_names(true)
            .finish();
        Self {
            dispatch: Dispatch::new(subscriber),
            writer,
        }
    }

    /// Log to a file, truncating it.
    pub fn to_file(path: impl AsRef<Path>, level: Level) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_target(Target::File(BufWriter::new(file)), level))
    }

    /// Log to standard error.
    pub fn stderr(level: Level) -> Self {
        Self::with_target(Target::Stderr, level)
    }

    /// Capture the log in memory.
    pub fn memory(level: Level) -> (Self, MemoryLog) {
        let capture = MemoryLog::default();
        (
            Self::with_target(Target::Memory(capture.clone()), level),
            capture,
        )
    }

    /// Drop every line.
    pub fn discard() -> Self {
        Self::with_target(Target::Discard, Level::ERROR)
    }

    /// Run `f` with this log as the thread's default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// Flush buffered lines to the sink.
    pub fn flush(&self) -> io::Result<()> {
        self.writer.clone().flush()
    }
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog").finish_non_exhaustive()
    }
}
