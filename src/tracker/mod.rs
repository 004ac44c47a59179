use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    storage::activity_file::{ActivityFile, ActivityRepository},
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowObserver, WindowObserver},
};

pub mod config;
pub mod shutdown;
pub mod tracking_loop;

use config::TrackerConfig;
use tracking_loop::TrackingLoop;

/// Represents the starting point for the tracker. Runs until the process is interrupted.
pub async fn start_tracker(config: TrackerConfig) -> Result<()> {
    info!(
        "Starting {} {} on {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );
    let observer = GenericWindowObserver::new()?;
    let shutdown_token = CancellationToken::new();

    let signals = tokio::spawn(shutdown::detect_shutdown(shutdown_token.clone()));
    let result = run_tracker(
        ActivityFile::new(config.activities_path.clone()),
        observer,
        &shutdown_token,
        DefaultClock,
        &config,
    )
    .await;

    shutdown_token.cancel();
    let _ = signals.await;
    info!("Closing {}", env!("CARGO_PKG_NAME"));
    result
}

/// Loads the persisted store through `repository` and tracks until `shutdown_token` is cancelled.
async fn run_tracker<R: ActivityRepository>(
    repository: R,
    observer: impl WindowObserver + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
    config: &TrackerConfig,
) -> Result<()> {
    let store = repository.load().await?;
    let tracker = TrackingLoop::new(
        Box::new(observer),
        repository,
        store,
        shutdown_token.clone(),
        config.save_frequency,
        config.poll_interval,
        Box::new(clock),
    );
    tracker.run().await?;
    Ok(())
}

#[cfg(test)]
mod tracker_tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::{
        storage::activity_file::{ActivityFile, ActivityRepository},
        tracker::{
            config::TrackerConfig,
            run_tracker,
            tracking_loop::tests::{TestClock, TEST_START_DATE},
        },
        utils::logging::TEST_LOGGING,
        window_api::MockWindowObserver,
    };

    /// Runs the whole pipeline against a real file twice, the second run has to continue from
    /// what the first one saved.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_tracker() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let config = TrackerConfig::new(dir.path().join("activities.json"));

        for _ in 0..2 {
            let start = Instant::now();
            let mut observer = MockWindowObserver::new();
            observer.expect_get_active().returning(move || {
                let label = if start.elapsed() < Duration::from_secs(40) {
                    "Terminal"
                } else {
                    "Chromium/MySite"
                };
                Ok(Some(label.into()))
            });

            let shutdown = CancellationToken::new();
            let canceller = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(61)).await;
                canceller.cancel();
            });

            run_tracker(
                ActivityFile::new(config.activities_path.clone()),
                observer,
                &shutdown,
                TestClock::new(),
                &config,
            )
            .await?;
        }

        let store = ActivityFile::new(config.activities_path.clone()).load().await?;
        assert_eq!(store.len(), 2);

        let terminal = store.get("Terminal").unwrap();
        assert_eq!(terminal.entries().len(), 2);
        assert_eq!(terminal.total_duration(), chrono::Duration::seconds(80));
        assert_eq!(terminal.entries()[0].start(), TEST_START_DATE);

        let browser = store.get("Chromium/MySite").unwrap();
        assert_eq!(browser.entries().len(), 2);
        assert_eq!(browser.total_duration(), chrono::Duration::seconds(42));
        Ok(())
    }
}
