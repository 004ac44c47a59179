//! Passively watches which window has focus and accumulates the time spent in each one.
//! Activities are periodically checkpointed into a JSON file and saved once more whenever the
//! tracker stops.
//!

pub mod cli;
pub mod storage;
pub mod tracker;
pub mod utils;
pub mod window_api;
