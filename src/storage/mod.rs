//!  Storage is organized around [activity::ActivityStore].
//!  The basic idea is:
//!   - Every distinct window label is an [activity::Activity] that accumulates time.
//!   - Each contiguous focused interval is an [activity::TimeEntry] owned by its activity.
//!   - The whole store is persisted as a single JSON file which is rewritten on every
//!     checkpoint through [activity_file::ActivityFile].

pub mod activity;
pub mod activity_file;
pub mod entities;
