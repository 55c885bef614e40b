use std::{io::IsTerminal, time::Duration};

use colconv_core::{ConvertOptions, convert_interruptible, outcome::EXIT_FAILURE};
use snafu::ResultExt;
use tracing_subscriber::EnvFilter;

use crate::error::{CliResult, RuntimeSnafu};

/// Environment variable that overrides the log filter.
pub const LOG_ENV: &str = "COLCONV_LOG";

/// Send `log` records to stderr. Warnings by default, `colconv` info with
/// `verbose`, anything when `COLCONV_LOG` is set.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,colconv_core=info")
        } else {
            EnvFilter::new("warn")
        }
    });

    // Stdout carries data; logs never go there.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Time given to aborted tasks to drop their output before the process exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn build_runtime(threads: Option<usize>) -> CliResult<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    let workers = threads.unwrap_or_else(|| {
        std::thread::available_parallelism().map_or(1, |n| n.get())
    });
    // Plus one worker that keeps driving Ctrl+C while the writer is blocked
    // on a stalled stdout.
    builder.worker_threads(workers + 1);
    builder.build().context(RuntimeSnafu)
}

/// Run one conversion to completion and return the process exit code.
pub fn run_to_exit_code(opts: &ConvertOptions) -> i32 {
    let runtime = match build_runtime(opts.exec.threads.map(|n| n.get())) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[Error] {e}");
            return EXIT_FAILURE;
        }
    };

    let outcome = runtime.block_on(convert_interruptible(opts));
    // A task stuck writing to a stalled pipe never yields; do not wait on it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    if let Some(message) = outcome.message() {
        eprintln!("{message}");
    }
    outcome.exit_code()
}
