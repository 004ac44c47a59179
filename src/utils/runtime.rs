use std::future::Future;

use anyhow::{Context, Result};

/// Drives `task` to completion on a fresh current-thread runtime. The tracking loop is a single
/// cooperative task, so there is nothing for worker threads to do.
pub fn block_on<T>(task: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?
        .block_on(task)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::block_on;

    #[test]
    fn test_block_on_returns_task_result() {
        let value = block_on(async {
            tokio::task::yield_now().await;
            Ok(7)
        })
        .unwrap();
        assert_eq!(value, 7);

        let failed = block_on(async { Err::<(), _>(anyhow!("Stopped")) });
        assert_eq!(failed.unwrap_err().to_string(), "Stopped");
    }
}
