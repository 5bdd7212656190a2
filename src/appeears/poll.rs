use super::task::{Status, TaskStatus};
use crate::error::FetchError;
use crate::service::TaskService;
use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;

/// Time left until the next tick of a fixed cadence that started `elapsed` ago.
pub fn next_delay(elapsed: Duration, interval: Duration) -> Duration {
    if interval.is_zero() {
        return Duration::ZERO;
    }
    let into_tick = elapsed.as_nanos() % interval.as_nanos();
    interval - Duration::from_nanos(into_tick as u64)
}

/// Consecutive reports of the same unrecognised status before giving up.
const UNRECOGNISED_STATUS_LIMIT: usize = 3;

/// Polls the task status on a fixed cadence until the service reports `done`.
pub async fn wait_until_done(
    service: &impl TaskService,
    task_id: &str,
    interval: Duration,
) -> Result<TaskStatus> {
    let start = Instant::now();
    let mut unrecognised: Option<(String, usize)> = None;
    loop {
        let status = service.status(task_id).await?;
        match status.status {
            Status::Done => {
                tracing::info!(task_id, "Task complete");
                return Ok(status);
            }
            Status::Error => return Err(FetchError::TaskFailed(task_id.to_string()).into()),
            Status::Other(ref other) => {
                let repeats = match unrecognised.take() {
                    Some((previous, n)) if previous == *other => n + 1,
                    _ => 1,
                };
                tracing::warn!(task_id, status = %other, repeats, "Unrecognised task status");
                if repeats >= UNRECOGNISED_STATUS_LIMIT {
                    return Err(FetchError::UnexpectedStatus {
                        task_id: task_id.to_string(),
                        status: other.clone(),
                    }
                    .into());
                }
                unrecognised = Some((other.clone(), repeats));
            }
            ref current => {
                unrecognised = None;
                tracing::info!(task_id, status = %current, "Waiting for task");
            }
        }
        tokio::time::sleep(next_delay(start.elapsed(), interval)).await;
    }
}
