use std::{panic::AssertUnwindSafe, time::Duration};

use anyhow::Result;
use chrono::NaiveDateTime;
use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    storage::{
        activity::{ActivityStore, TimeEntry},
        activity_file::ActivityRepository,
    },
    utils::clock::Clock,
    window_api::WindowObserver,
};

/// What the tracker currently believes the user is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingState {
    /// Nothing has been observed yet.
    Idle,
    /// `name` has been focused since `since`, which the monotonic clock saw as `started`. A `None`
    /// name means the focused window is unknown, time spent in that state isn't attributed to
    /// anything.
    Tracking {
        name: Option<String>,
        since: NaiveDateTime,
        started: Instant,
    },
}

/// Polls the focused window, closes an interval every time it changes and checkpoints the store.
///
/// The store is written every `save_frequency` and once more whenever [TrackingLoop::run] ends,
/// whether through cancellation, an error or a panic.
pub struct TrackingLoop<R: ActivityRepository> {
    observer: Box<dyn WindowObserver>,
    repository: R,
    store: ActivityStore,
    shutdown: CancellationToken,
    save_frequency: Duration,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
    state: TrackingState,
    last_checkpoint: Instant,
}

impl<R: ActivityRepository> TrackingLoop<R> {
    pub fn new(
        observer: Box<dyn WindowObserver>,
        repository: R,
        store: ActivityStore,
        shutdown: CancellationToken,
        save_frequency: Duration,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        let last_checkpoint = time_provider.instant();
        Self {
            observer,
            repository,
            store,
            shutdown,
            save_frequency,
            poll_interval,
            time_provider,
            state: TrackingState::Idle,
            last_checkpoint,
        }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    fn now(&self) -> (NaiveDateTime, Instant) {
        (
            self.time_provider.time().naive_local(),
            self.time_provider.instant(),
        )
    }

    /// Applies one observation made at wall time `now`, which the monotonic clock saw as
    /// `instant`. Returns whether the focused activity changed.
    ///
    /// A change closes the interval of the previous activity and records it under the previous
    /// name. Unknown windows never get recorded.
    pub fn observe(
        &mut self,
        observed: Option<String>,
        now: NaiveDateTime,
        instant: Instant,
    ) -> bool {
        if let TrackingState::Tracking { name, .. } = &self.state {
            if *name == observed {
                return false;
            }
        }

        debug!("Focus moved to {:?}", observed);
        let previous = std::mem::replace(
            &mut self.state,
            TrackingState::Tracking {
                name: observed,
                since: now,
                started: instant,
            },
        );
        if let TrackingState::Tracking {
            name: Some(name),
            since,
            started,
        } = previous
        {
            let end = interval_end(&name, since, started, now, instant);
            self.close_interval(&name, since, end);
        }
        true
    }

    fn close_interval(&mut self, name: &str, since: NaiveDateTime, end: NaiveDateTime) {
        match TimeEntry::new(since, end) {
            Some(entry) => {
                debug!("Recording {}s of {name:?}", entry.duration().num_seconds());
                self.store.record(name, entry);
            }
            None => error!("Interval of {name:?} ends before it starts: {since} > {end}"),
        }
    }

    /// Closes the interval that is still open so that it isn't lost at shutdown. Intervals
    /// shorter than a second are dropped.
    fn close_open_interval(&mut self, now: NaiveDateTime, instant: Instant) {
        let state = std::mem::replace(&mut self.state, TrackingState::Idle);
        if let TrackingState::Tracking {
            name: Some(name),
            since,
            started,
        } = state
        {
            let end = interval_end(&name, since, started, now, instant);
            if end - since >= chrono::Duration::seconds(1) {
                self.close_interval(&name, since, end);
            }
        }
    }

    async fn checkpoint(&mut self) -> Result<()> {
        let records = self.store.serialize();
        self.last_checkpoint = self.time_provider.instant();
        self.repository
            .save(&records)
            .await
            .inspect_err(|e| error!("Failed to save activities {e:?}"))?;
        info!("Saved {} activities", records.len());
        Ok(())
    }

    /// A failed periodic checkpoint is retried after another `save_frequency`.
    async fn checkpoint_if_due(&mut self) {
        let elapsed = self.time_provider.instant() - self.last_checkpoint;
        if elapsed > self.save_frequency {
            if let Err(e) = self.checkpoint().await {
                warn!("Keeping activities in memory until the next checkpoint: {e}");
            }
        }
    }

    async fn track(&mut self) -> Result<()> {
        let initial = self.observer.get_active()?;
        let (now, instant) = self.now();
        self.observe(initial, now, instant);

        loop {
            if self.shutdown.is_cancelled() {
                return Ok(());
            }

            let observed = self.observer.get_active()?;
            let (now, instant) = self.now();
            let changed = self.observe(observed, now, instant);

            self.checkpoint_if_due().await;

            if changed {
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep(self.poll_interval) => ()
            }
        }
    }

    /// Executes the tracking loop until the shutdown token is cancelled or the observer fails.
    /// The open interval is closed and the store saved on every way out of the loop.
    pub async fn run(mut self) -> Result<ActivityStore> {
        info!("Tracking focused windows");
        let outcome = AssertUnwindSafe(self.track()).catch_unwind().await;

        let (now, instant) = self.now();
        self.close_open_interval(now, instant);
        let saved = self.checkpoint().await;

        match outcome {
            Ok(Ok(())) => {
                saved?;
                info!("Tracking stopped");
                Ok(self.store)
            }
            Ok(Err(e)) => {
                error!("Tracking failed {e:?}");
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Wall time at which an interval that began at `since`/`started` ends. If the wall clock went
/// backwards in the meantime, as it does when daylight saving time ends, the end is derived from
/// the monotonic clock instead so that the focused time is kept.
fn interval_end(
    name: &str,
    since: NaiveDateTime,
    started: Instant,
    now: NaiveDateTime,
    instant: Instant,
) -> NaiveDateTime {
    if now >= since {
        return now;
    }
    let elapsed = instant.saturating_duration_since(started);
    warn!(
        "Clock went back from {since} to {now} while {name:?} was focused, counting {}s of monotonic time",
        elapsed.as_secs()
    );
    since + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
}
