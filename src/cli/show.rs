use std::{fmt::Write, path::{Path, PathBuf}};

use anyhow::Result;

use crate::{
    storage::{
        activity::ActivityStore,
        activity_file::{ActivityFile, ActivityRepository},
    },
    utils::time::{format_duration, format_timestamp},
};

use super::resolve_activities_path;

#[derive(Debug, clap::Args)]
pub struct ShowCommand {
    #[arg(
        long = "activities-filepath",
        help = "Path of the activities file. By default activities.json in the application directory"
    )]
    activities_filepath: Option<PathBuf>,
    #[arg(short, long, help = "Also print every time entry")]
    entries: bool,
}

/// Prints every activity from the activities file, longest first.
pub async fn process_show_command(
    ShowCommand {
        activities_filepath,
        entries,
    }: ShowCommand,
    app_dir: &Path,
) -> Result<()> {
    let path = resolve_activities_path(activities_filepath, app_dir)?;
    let store = ActivityFile::new(path).read_only().load().await?;
    print!("{}", render_activities(&store, entries));
    Ok(())
}

fn render_activities(store: &ActivityStore, with_entries: bool) -> String {
    let mut activities = store.activities().iter().collect::<Vec<_>>();
    activities.sort_by(|a, b| b.total_duration().cmp(&a.total_duration()));

    let mut output = String::new();
    for activity in activities {
        let _ = writeln!(
            output,
            "{}\t{}\t{}",
            format_duration(activity.total_duration()),
            activity.entries().len(),
            activity.name()
        );
        if with_entries {
            for entry in activity.entries() {
                let _ = writeln!(
                    output,
                    "\t{} -> {}\t{}",
                    format_timestamp(entry.start()),
                    format_timestamp(entry.end()),
                    format_duration(entry.duration())
                );
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::storage::activity::{ActivityStore, TimeEntry};

    use super::render_activities;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn test_store() -> ActivityStore {
        let mut store = ActivityStore::new();
        let entry = |from: i64, to: i64| {
            TimeEntry::new(
                TEST_START_DATE + Duration::seconds(from),
                TEST_START_DATE + Duration::seconds(to),
            )
            .unwrap()
        };
        store.record("Terminal", entry(0, 10));
        store.record("Chromium/MySite", entry(10, 100));
        store.record("Terminal", entry(100, 105));
        store
    }

    #[test]
    fn test_render_activities() {
        assert_eq!(
            render_activities(&test_store(), false),
            "1m30s\t1\tChromium/MySite\n15s\t2\tTerminal\n"
        );
    }

    #[test]
    fn test_render_entries() {
        let rendered = render_activities(&test_store(), true);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "\t2018-07-04 00:00:10 -> 2018-07-04 00:01:40\t1m30s");
        assert_eq!(lines[4], "\t2018-07-04 00:01:40 -> 2018-07-04 00:01:45\t5s");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_activities(&ActivityStore::new(), true), "");
    }
}
