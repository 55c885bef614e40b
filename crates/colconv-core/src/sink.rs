//! Byte sinks for converted output: stdout or an atomically committed file.
//!
//! File output goes to a temporary sibling of the target and is renamed into
//! place by [`OutputSink::finish`]. Dropping an unfinished sink (error,
//! interrupt) removes the temporary file, so a failed run never leaves a
//! partial output behind.
//!
//! Stdout output records an `EPIPE` from the reader side in a [`PipeMonitor`].
//! Arrow's CSV writer flattens I/O errors into strings, so the monitor is how
//! the pipeline tells a closed pipe apart from a real failure.

use std::{
    fmt,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use snafu::ResultExt;
use tokio::fs;

use crate::error::{BrokenPipeSnafu, ConvertResult, FinishOutputSnafu, OpenOutputSnafu};

/// Where converted data goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Process standard output.
    Stdout,
    /// A file path, created or replaced on success.
    File(PathBuf),
}

impl Destination {
    /// Build from an optional `--output` path.
    pub fn from_output(output: Option<&Path>) -> Self {
        match output {
            Some(p) => Destination::File(p.to_path_buf()),
            None => Destination::Stdout,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => write!(f, "<stdout>"),
            Destination::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Shared flag set once a write hits a closed pipe.
#[derive(Debug, Clone, Default)]
pub struct PipeMonitor(Arc<AtomicBool>);

impl PipeMonitor {
    /// True once any write or flush observed `BrokenPipe`.
    pub fn is_broken(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn observe(&self, err: &io::Error) {
        if err.kind() == io::ErrorKind::BrokenPipe {
            self.0.store(true, Ordering::Relaxed);
        }
    }
}

/// Writer adapter that reports `BrokenPipe` errors to a [`PipeMonitor`].
pub(crate) struct WatchPipe<W> {
    inner: W,
    monitor: PipeMonitor,
}

impl<W: Write> WatchPipe<W> {
    pub(crate) fn new(inner: W, monitor: PipeMonitor) -> Self {
        Self { inner, monitor }
    }
}

impl<W: Write> Write for WatchPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).inspect_err(|e| self.monitor.observe(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().inspect_err(|e| self.monitor.observe(e))
    }
}

/// Guard that removes a temporary file on drop unless disarmed.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Call after the temp file has been renamed into place.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort; we are already on an error path.
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// `<target>.tmp` next to the target, so the final rename stays on one
/// filesystem.
fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    final_path.with_file_name(format!("{name}.tmp"))
}

/// File output staged in a temp sibling until [`LocalSink::commit`].
struct LocalSink {
    final_path: PathBuf,
    writer: io::BufWriter<std::fs::File>,
    staged: TempFileGuard,
}

impl LocalSink {
    async fn open(final_path: &Path) -> ConvertResult<Self> {
        let display = final_path.display().to_string();
        match final_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
                .await
                .context(OpenOutputSnafu { path: &display })?,
            _ => {}
        }

        let tmp_path = temp_path_for(final_path);
        let file = std::fs::File::create(&tmp_path).context(OpenOutputSnafu { path: &display })?;

        Ok(Self {
            final_path: final_path.to_path_buf(),
            writer: io::BufWriter::new(file),
            staged: TempFileGuard::new(tmp_path),
        })
    }

    /// Flush, fsync and move the staged file over the target.
    async fn commit(mut self) -> ConvertResult<()> {
        let persisted = async {
            self.writer.flush()?;
            self.writer.get_ref().sync_all()?;
            fs::rename(&self.staged.path, &self.final_path).await
        }
        .await;
        persisted.context(FinishOutputSnafu {
            path: self.final_path.display().to_string(),
        })?;

        self.staged.disarm();
        Ok(())
    }
}

enum OutputSinkInner {
    Stdout(WatchPipe<io::BufWriter<io::Stdout>>),
    Local(LocalSink),
}

/// A streaming byte sink for one conversion.
///
/// Obtain one with [`open_output_sink`], stream bytes through its `Write`
/// impl, then commit with [`OutputSink::finish`].
pub struct OutputSink {
    inner: OutputSinkInner,
    monitor: PipeMonitor,
}

impl OutputSink {
    /// Handle that reports whether stdout's reader went away.
    pub fn pipe_monitor(&self) -> PipeMonitor {
        self.monitor.clone()
    }

    /// Flush and commit. For files: fsync and rename into place.
    pub async fn finish(self) -> ConvertResult<()> {
        match self.inner {
            OutputSinkInner::Stdout(mut w) => {
                if let Err(e) = w.flush() {
                    if self.monitor.is_broken() {
                        return BrokenPipeSnafu.fail();
                    }
                    return Err(e).context(FinishOutputSnafu {
                        path: Destination::Stdout.to_string(),
                    });
                }
                Ok(())
            }
            OutputSinkInner::Local(s) => s.commit().await,
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            OutputSinkInner::Stdout(w) => w.write(buf),
            OutputSinkInner::Local(s) => s.writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            OutputSinkInner::Stdout(w) => w.flush(),
            OutputSinkInner::Local(s) => s.writer.flush(),
        }
    }
}

/// Open a sink for `destination`.
pub async fn open_output_sink(destination: &Destination) -> ConvertResult<OutputSink> {
    let monitor = PipeMonitor::default();
    let inner = match destination {
        Destination::Stdout => OutputSinkInner::Stdout(WatchPipe::new(
            io::BufWriter::new(io::stdout()),
            monitor.clone(),
        )),
        Destination::File(path) => OutputSinkInner::Local(LocalSink::open(path).await?),
    };
    Ok(OutputSink { inner, monitor })
}
