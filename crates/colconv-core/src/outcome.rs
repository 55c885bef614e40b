//! How a conversion ended, and the process exit code for it.
//!
//! Exactly one terminal state per run: success, interrupt (Ctrl+C), a closed
//! downstream pipe, or an error. A closed pipe counts as success so
//! `colconv data.parquet | head` behaves like any other Unix filter.

use log::warn;
use snafu::ResultExt;
use tokio::task::JoinError;

use crate::{
    convert::{ConvertOptions, ConvertReport, convert},
    error::{ConvertError, ConvertResult, TaskFailedSnafu},
};

/// Exit status for a run cut short by SIGINT (128 + 2).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit status for any error.
pub const EXIT_FAILURE: i32 = 1;

/// Terminal state of one conversion.
#[derive(Debug)]
pub enum Outcome {
    /// All rows were written.
    Success(ConvertReport),
    /// The user pressed Ctrl+C.
    Interrupted,
    /// Stdout's reader went away before we finished.
    BrokenPipe,
    /// Anything else.
    Failed(ConvertError),
}

impl Outcome {
    /// Classify a conversion result.
    pub fn from_result(result: ConvertResult<ConvertReport>) -> Self {
        match result {
            Ok(report) => Outcome::Success(report),
            Err(e) if e.is_broken_pipe() => Outcome::BrokenPipe,
            Err(e) => Outcome::Failed(e),
        }
    }

    fn from_joined(joined: Result<ConvertResult<ConvertReport>, JoinError>) -> Self {
        Self::from_result(joined.context(TaskFailedSnafu).and_then(|result| result))
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success(_) | Outcome::BrokenPipe => 0,
            Outcome::Interrupted => EXIT_INTERRUPTED,
            Outcome::Failed(_) => EXIT_FAILURE,
        }
    }

    /// The single line to print on stderr, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Success(_) | Outcome::BrokenPipe => None,
            Outcome::Interrupted => Some("\nInterrupted (Ctrl+C)".to_string()),
            Outcome::Failed(e) => Some(format!("[Error] {e}")),
        }
    }
}

/// Run [`convert`] on its own task, giving up early if Ctrl+C arrives.
///
/// The conversion may block a worker thread on a stalled stdout, so the
/// signal is awaited from the caller's task. On interrupt the conversion task
/// is aborted; once it is dropped its output sink removes any temporary file.
pub async fn convert_interruptible(opts: &ConvertOptions) -> Outcome {
    let opts = opts.clone();
    let mut task = tokio::spawn(async move { convert(&opts).await });

    tokio::select! {
        joined = &mut task => return Outcome::from_joined(joined),
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                task.abort();
                return Outcome::Interrupted;
            }
            Err(e) => warn!("Could not listen for Ctrl+C: {e}"),
        },
    }

    Outcome::from_joined(task.await)
}
