use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::warn;

use crate::Result;

/// Poll `task` up to `max_attempts` times, sleeping `interval` between
/// attempts. Returns the first success or the last error.
pub(crate) async fn task_with_fixed_interval<F, T, P>(
    task: F,
    max_attempts: usize,
    interval: Duration,
) -> Result<P>
where
    F: Fn() -> T,
    T: Future<Output = Result<P>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match task().await {
            Ok(r) => return Ok(r),
            Err(e) if attempt >= max_attempts => {
                warn!("task failed after {} attempts", attempt);
                return Err(e);
            }
            Err(e) => {
                debug!("#{}: not ready yet ({})", attempt, e);
                sleep(interval).await;
            }
        }
    }
}

/// Spawn a named task whose outcome is collected through the returned handle.
pub(crate) fn spawn_task<Fut>(
    name: &str,
    fut: Fut,
) -> JoinHandle<Result<()>>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        let result = fut.await;
        match &result {
            Ok(()) => debug!("task {name} DONE"),
            Err(e) => warn!("task {name} stopped with an error: {:?}", e),
        }
        result
    })
}
