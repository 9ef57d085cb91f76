use std::time::Duration;

use anyhow::Result;
use habitrack::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

/// Stdin is read on a blocking thread that can't be interrupted, so shutdown doesn't wait for it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}
