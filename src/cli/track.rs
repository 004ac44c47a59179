use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::Result;
use tracing::level_filters::LevelFilter;

use crate::{
    tracker::{config::TrackerConfig, start_tracker},
    utils::{
        logging::{enable_logging, TRACKER_PREFIX},
        runtime::block_on,
    },
};

use super::resolve_activities_path;

#[derive(Debug, clap::Args)]
pub struct TrackCommand {
    #[arg(
        long = "activities-filepath",
        help = "Path of the file to read and save activities. By default activities.json in the application directory"
    )]
    activities_filepath: Option<PathBuf>,
    #[arg(
        long = "save-frequency",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between two saves of the activities file"
    )]
    save_frequency: u64,
    #[arg(
        long = "poll-interval",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait between checks of the focused window"
    )]
    poll_interval: u64,
    #[arg(long, help = "Keep tracking in the background")]
    detach: bool,
}

impl TrackCommand {
    fn into_config(self, app_dir: &Path) -> Result<TrackerConfig> {
        Ok(TrackerConfig {
            activities_path: resolve_activities_path(self.activities_filepath, app_dir)?,
            save_frequency: Duration::from_secs(self.save_frequency),
            poll_interval: Duration::from_secs(self.poll_interval),
        })
    }
}

pub fn process_track_command(
    command: TrackCommand,
    app_dir: &Path,
    log: Option<LevelFilter>,
    log_console: bool,
) -> Result<()> {
    let detach = command.detach;
    let config = command.into_config(app_dir)?;

    if detach && detach_process()? {
        return Ok(());
    }

    enable_logging(TRACKER_PREFIX, &app_dir.join("logs"), log, log_console)?;
    block_on(start_tracker(config))
}

/// Moves tracking into the background. Returns `true` in the process that should exit right away.
fn detach_process() -> Result<bool> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use daemonize::Daemonize;
            use tracing::error;

            let daemonize = Daemonize::new()
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent
                        .inspect_err(|e| error!("Failed to create tracker on parent side {e:?}"))?;
                    println!("Tracking in the background");
                    Ok(true)
                }
                daemonize::Outcome::Child(child) => {
                    child?;
                    Ok(false)
                }
            }
        }
        else if #[cfg(feature = "win")] {
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::DETACHED_PROCESS;

            let process_name = std::env::current_exe()?;
            let mut command = std::process::Command::new(process_name);
            command.args(std::env::args().skip(1).filter(|v| v != "--detach"));
            command.creation_flags(DETACHED_PROCESS.0);
            command.stdin(std::process::Stdio::null());
            command.stdout(std::process::Stdio::null());
            command.stderr(std::process::Stdio::null());
            #[allow(clippy::zombie_processes)]
            command.spawn()?;
            println!("Tracking in the background");
            Ok(true)
        }
        else {
            Err(anyhow::anyhow!("Detaching isn't supported on this platform"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use clap::Parser;

    use crate::cli::{Args, Commands};

    #[test]
    fn test_track_defaults() {
        let args = Args::parse_from(["timetracker", "track"]);
        let Commands::Track { command } = args.commands else {
            panic!("Expected track command");
        };
        assert!(!command.detach);

        let config = command.into_config(Path::new("/tmp/timetracker")).unwrap();
        assert_eq!(config.save_frequency, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(
            config.activities_path,
            Path::new("/tmp/timetracker/activities.json")
        );
    }
}
