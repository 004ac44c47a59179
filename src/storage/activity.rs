use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, SubsecRound};
use tracing::warn;

use crate::utils::time::duration_to_seconds;

use super::entities::{ActivityEntity, TimeEntryEntity};

/// One contiguous interval during which a single activity was focused. Timestamps are local wall
/// time truncated to whole seconds, which is the precision of the activities file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEntry {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeEntry {
    /// Returns `None` if `end` is before `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        let start = start.trunc_subsecs(0);
        let end = end.trunc_subsecs(0);
        if end < start {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl From<&TimeEntry> for TimeEntryEntity {
    fn from(entry: &TimeEntry) -> Self {
        TimeEntryEntity {
            delta: duration_to_seconds(entry.duration()),
            end_time: entry.end,
            start_time: entry.start,
        }
    }
}

/// Named accumulator of time entries. The only way to change an activity is through
/// [ActivityStore::record], which keeps `total_duration` equal to the sum of entry durations.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    name: String,
    total_duration: Duration,
    entries: Vec<TimeEntry>,
}

impl Activity {
    fn new(name: String) -> Self {
        Self {
            name,
            total_duration: Duration::zero(),
            entries: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    fn push(&mut self, entry: TimeEntry) {
        self.total_duration += entry.duration();
        self.entries.push(entry);
    }

    fn to_entity(&self) -> ActivityEntity {
        ActivityEntity {
            duration: duration_to_seconds(self.total_duration),
            entries: self.entries.iter().map(TimeEntryEntity::from).collect(),
            name: self.name.clone(),
        }
    }
}

/// Every known activity, at most one per name. Activities keep the order in which they were first
/// seen, which is also the order they are serialized in.
#[derive(Debug, Default)]
pub struct ActivityStore {
    activities: Vec<Activity>,
    index: HashMap<String, usize>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted records. Durations are recomputed from entry timestamps,
    /// stored `duration` and `delta` values are ignored. Records with an empty name and entries
    /// that end before they start are dropped, records sharing a name are merged.
    pub fn load(records: impl IntoIterator<Item = ActivityEntity>) -> Self {
        let mut store = Self::new();
        for record in records {
            if record.name.is_empty() {
                warn!("Skipping activity without a name");
                continue;
            }
            store.find_or_create(&record.name);
            for entry in record.entries {
                match TimeEntry::new(entry.start_time, entry.end_time) {
                    Some(v) => store.record(&record.name, v),
                    None => warn!(
                        "Skipping entry of {:?} that ends before it starts: {} > {}",
                        record.name, entry.start_time, entry.end_time
                    ),
                }
            }
        }
        store
    }

    /// Returns the activity named `name`, registering an empty one if it wasn't seen before.
    pub fn find_or_create(&mut self, name: &str) -> &mut Activity {
        let index = match self.index.get(name) {
            Some(index) => *index,
            None => {
                let index = self.activities.len();
                self.activities.push(Activity::new(name.to_string()));
                self.index.insert(name.to_string(), index);
                index
            }
        };
        &mut self.activities[index]
    }

    /// Appends `entry` to the activity named `name`. All changes to activities go through here.
    pub fn record(&mut self, name: &str, entry: TimeEntry) {
        debug_assert!(!name.is_empty(), "Activities must be named");
        self.find_or_create(name).push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&Activity> {
        self.index.get(name).map(|index| &self.activities[*index])
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Projects the store into persisted records. Doesn't change the store.
    pub fn serialize(&self) -> Vec<ActivityEntity> {
        self.activities.iter().map(Activity::to_entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use crate::storage::entities::{ActivityEntity, TimeEntryEntity};

    use super::{ActivityStore, TimeEntry};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn at(seconds: i64) -> NaiveDateTime {
        TEST_START_DATE + Duration::seconds(seconds)
    }

    fn entry(from: i64, to: i64) -> TimeEntry {
        TimeEntry::new(at(from), at(to)).unwrap()
    }

    fn assert_consistent(store: &ActivityStore) {
        for activity in store.activities() {
            let sum = activity
                .entries()
                .iter()
                .fold(Duration::zero(), |acc, v| acc + v.duration());
            assert_eq!(activity.total_duration(), sum, "{}", activity.name());
        }
    }

    #[test]
    fn test_time_entry_rejects_reversed_interval() {
        assert!(TimeEntry::new(at(10), at(5)).is_none());
        assert_eq!(entry(5, 5).duration(), Duration::zero());
    }

    #[test]
    fn test_time_entry_truncates_subseconds() {
        let entry = TimeEntry::new(
            at(1) + Duration::milliseconds(900),
            at(3) + Duration::milliseconds(100),
        )
        .unwrap();
        assert_eq!(entry.start(), at(1));
        assert_eq!(entry.end(), at(3));
        assert_eq!(entry.duration(), Duration::seconds(2));
    }

    #[test]
    fn test_find_or_create_returns_same_activity() {
        let mut store = ActivityStore::new();
        let first = store.find_or_create("Editor") as *const _;
        let second = store.find_or_create("Editor") as *const _;
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);

        store.find_or_create("editor");
        assert_eq!(store.len(), 2);

        let created = store.get("Editor").unwrap();
        assert_eq!(created.total_duration(), Duration::zero());
        assert!(created.entries().is_empty());
    }

    #[test]
    fn test_record_keeps_duration_consistent() {
        let mut store = ActivityStore::new();
        let intervals = [(0, 3), (3, 10), (10, 10), (15, 75), (75, 76), (100, 3700)];
        for (i, (from, to)) in intervals.into_iter().enumerate() {
            let name = if i % 2 == 0 { "A" } else { "B" };
            store.record(name, entry(from, to));
            assert_consistent(&store);
        }

        let a = store.get("A").unwrap();
        assert_eq!(a.entries().len(), 3);
        assert_eq!(a.total_duration(), Duration::seconds(3 + 0 + 1));
        let b = store.get("B").unwrap();
        assert_eq!(b.entries().len(), 3);
        assert_eq!(b.total_duration(), Duration::seconds(7 + 60 + 3600));
        assert_eq!(b.entries()[0], entry(3, 10));
    }

    #[test]
    fn test_serialize_is_pure() {
        let mut store = ActivityStore::new();
        store.record("A", entry(0, 30));
        store.record("B", entry(30, 45));

        let first = store.serialize();
        let second = store.serialize();
        assert_eq!(first, second);
        assert_eq!(first[0].name, "A");
        assert_eq!(first[0].duration, 30.);
        assert_eq!(first[1].entries[0].delta, 15.);
        assert_eq!(store.get("A").unwrap().total_duration(), Duration::seconds(30));
    }

    #[test]
    fn test_load_recomputes_durations() {
        let records = vec![ActivityEntity {
            duration: 9999.,
            entries: vec![
                TimeEntryEntity {
                    delta: 1234.,
                    end_time: at(20),
                    start_time: at(0),
                },
                TimeEntryEntity {
                    delta: 1.,
                    end_time: at(40),
                    start_time: at(30),
                },
            ],
            name: "Editor".into(),
        }];

        let store = ActivityStore::load(records);
        let activity = store.get("Editor").unwrap();
        assert_eq!(activity.total_duration(), Duration::seconds(30));
        assert_eq!(store.serialize()[0].entries[0].delta, 20.);
        assert_consistent(&store);
    }

    #[test]
    fn test_load_drops_invalid_and_merges_duplicates() {
        let records = vec![
            ActivityEntity {
                duration: 0.,
                entries: vec![TimeEntryEntity {
                    delta: 0.,
                    end_time: at(10),
                    start_time: at(0),
                }],
                name: "A".into(),
            },
            ActivityEntity {
                duration: 0.,
                entries: vec![TimeEntryEntity {
                    delta: 0.,
                    end_time: at(1),
                    start_time: at(0),
                }],
                name: "".into(),
            },
            ActivityEntity {
                duration: 0.,
                entries: vec![
                    TimeEntryEntity {
                        delta: 0.,
                        end_time: at(20),
                        start_time: at(30),
                    },
                    TimeEntryEntity {
                        delta: 0.,
                        end_time: at(50),
                        start_time: at(40),
                    },
                ],
                name: "A".into(),
            },
            ActivityEntity {
                duration: 0.,
                entries: vec![],
                name: "Empty".into(),
            },
        ];

        let store = ActivityStore::load(records);
        assert_eq!(store.len(), 2);
        let a = store.get("A").unwrap();
        assert_eq!(a.entries().len(), 2);
        assert_eq!(a.total_duration(), Duration::seconds(20));
        assert!(store.get("Empty").unwrap().entries().is_empty());
        assert_consistent(&store);
    }

    #[test]
    fn test_serialize_load_round_trip() {
        let mut store = ActivityStore::new();
        store.record("A", entry(0, 12));
        store.record("Chromium/MySite", entry(12, 50));
        store.record("A", entry(50, 51));

        let serialized = store.serialize();
        let reloaded = ActivityStore::load(serialized.clone());
        assert_eq!(reloaded.serialize(), serialized);
    }
}
