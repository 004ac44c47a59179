use std::path::Path;

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

const TRACK_COMMAND: &str = "track";

/// Terminates every other tracker started from the executable at `name`. Trackers exit through
/// their termination checkpoint, so nothing recorded is lost. Returns how many were stopped.
pub fn stop_trackers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't get current pid: {e}"))?;
    let mut stopped = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id || process.thread_kind().is_some() {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        let is_tracker = process.cmd().iter().any(|arg| arg == TRACK_COMMAND);
        if is_tracker
            && process
                .exe()
                .filter(|v| v.exists())
                .filter(|v| name == *v)
                .is_some()
        {
            info!("Stopping tracker {pid}");
            // This will forcefully terminate the process on Windows, which skips the final save
            // there. Anything better will require a lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            stopped += 1;
        }
    }
    Ok(stopped)
}
