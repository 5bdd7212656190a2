//! The task-queue operations the acquisition flow needs from a remote service
use crate::appeears::task::{Bundle, Task, TaskStatus, TaskSubmission};
use std::io::Write;

pub trait TaskService {
    async fn submit(&self, task: &Task) -> anyhow::Result<TaskSubmission>;

    async fn status(&self, task_id: &str) -> anyhow::Result<TaskStatus>;

    async fn bundle(&self, task_id: &str) -> anyhow::Result<Bundle>;

    /// Streams one bundle file into `out`, returning the number of bytes written.
    async fn download<W: Write + Send>(
        &self,
        task_id: &str,
        file_id: &str,
        out: &mut W,
    ) -> anyhow::Result<u64>;
}
