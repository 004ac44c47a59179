use std::{path::PathBuf, time::Duration};

pub const DEFAULT_ACTIVITIES_FILE: &str = "activities.json";
pub const DEFAULT_SAVE_FREQUENCY: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// File the activities are loaded from and checkpointed into.
    pub activities_path: PathBuf,
    /// Minimal time between two periodic checkpoints.
    pub save_frequency: Duration,
    /// How long to wait before polling again when the focused window didn't change.
    pub poll_interval: Duration,
}

impl TrackerConfig {
    pub fn new(activities_path: PathBuf) -> Self {
        Self {
            activities_path,
            save_frequency: DEFAULT_SAVE_FREQUENCY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
