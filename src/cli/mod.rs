pub mod current;
pub mod process;
pub mod show;
pub mod track;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use current::print_current;
use process::stop_trackers;
use show::{process_show_command, ShowCommand};
use track::{process_track_command, TrackCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    tracker::config::DEFAULT_ACTIVITIES_FILE,
    utils::{
        dir::{create_application_default_path, create_dir},
        logging::{enable_logging, CLI_PREFIX},
        runtime::block_on,
    },
};

#[derive(Parser, Debug)]
#[command(name = "timetracker", version, long_about = None)]
#[command(about = "Tracks how much time you spend in each window", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory used for logs and the default activities file. By default $XDG_STATE_HOME/timetracker or $HOME/.local/state/timetracker"
    )]
    dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides RUST_LOG")]
    log: Option<LevelFilter>,
    #[arg(long = "log-console", global = true, help = "Also print logs to stdout")]
    log_console: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Track focused windows until interrupted")]
    Track {
        #[command(flatten)]
        command: TrackCommand,
    },
    #[command(about = "Print tracked activities")]
    Show {
        #[command(flatten)]
        command: ShowCommand,
    },
    #[command(about = "Print the label of the currently focused window")]
    Current {},
    #[command(about = "Stop running trackers. They save their activities before exiting")]
    Stop {},
}

pub fn run_cli(args: Args) -> Result<()> {
    let app_dir = match args.dir {
        Some(dir) => create_dir(std::path::absolute(dir)?)?,
        None => create_application_default_path()?,
    };

    match args.commands {
        Commands::Track { command } => {
            process_track_command(command, &app_dir, args.log, args.log_console)
        }
        Commands::Show { command } => {
            enable_logging(CLI_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
            block_on(process_show_command(command, &app_dir))
        }
        Commands::Current {} => {
            enable_logging(CLI_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
            print_current()
        }
        Commands::Stop {} => {
            enable_logging(CLI_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
            let stopped = stop_trackers(&std::env::current_exe()?)?;
            println!("Stopped {stopped} trackers");
            Ok(())
        }
    }
}

/// Resolves the activities file passed on the command line, falling back to the one in the
/// application directory. The result is absolute so it survives a change of working directory.
fn resolve_activities_path(path: Option<PathBuf>, app_dir: &Path) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| app_dir.join(DEFAULT_ACTIVITIES_FILE));
    Ok(std::path::absolute(path)?)
}
