use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

/// The struct used for storing an activity on the disk. Fields are kept in alphabetical order so
/// that the written file has sorted keys.
///
/// `duration` is redundant and written for readers of the file only. It's recomputed from the
/// entries when loading.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityEntity {
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub entries: Vec<TimeEntryEntity>,
    pub name: String,
}

/// A single persisted interval. Same as with [ActivityEntity::duration], `delta` is never trusted
/// when reading.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct TimeEntryEntity {
    #[serde(default)]
    pub delta: f64,
    #[serde(with = "timestamp_ser")]
    pub end_time: NaiveDateTime,
    #[serde(with = "timestamp_ser")]
    pub start_time: NaiveDateTime,
}

mod timestamp_ser {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{format_timestamp, parse_timestamp};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(*timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}
