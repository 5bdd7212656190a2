use crate::appeears::task::Bundle;
use crate::service::TaskService;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct DownloadTask {
    task_id: String,
    file_id: String,
    file_name: String,
    output: PathBuf,
}

impl DownloadTask {
    pub fn new(task_id: &str, file_id: &str, file_name: &str, output: PathBuf) -> Self {
        DownloadTask {
            task_id: task_id.to_string(),
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            output,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct DownloadPlan {
    tasks: Vec<DownloadTask>,
}

impl DownloadPlan {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub async fn execute(&self, service: &impl TaskService) -> Result<u64> {
        let mut total = 0;
        for task in self.tasks.iter() {
            tracing::debug!(?task, "Current task");
            total += try_download(service, &task.task_id, &task.file_id, &task.output).await?;
        }
        Ok(total)
    }
}

/// One download task per bundle file, saved under `dest_dir`.
pub fn generate_download_plan(task_id: &str, bundle: &Bundle, dest_dir: &Path) -> DownloadPlan {
    let tasks = bundle
        .files
        .iter()
        .map(|file| {
            let output = dest_dir.join(file.local_name());
            DownloadTask::new(task_id, &file.file_id, &file.file_name, output)
        })
        .collect();
    DownloadPlan::new(tasks)
}

/// Downloads a bundle file to `output`, replacing anything already there.
pub async fn try_download(
    service: &impl TaskService,
    task_id: &str,
    file_id: &str,
    output: &Path,
) -> Result<u64> {
    // Make parent directories as necessary
    if let Some(parent_dir) = output.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }

    let mut partial_name = output.as_os_str().to_owned();
    partial_name.push(".partial");
    let partial = PathBuf::from(partial_name);

    let mut partial_file = File::create(&partial)?;
    let written = match service.download(task_id, file_id, &mut partial_file).await {
        Ok(n) => partial_file.flush().map(|_| n).map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };
    drop(partial_file);
    let byte_count = match written {
        Ok(n) => n,
        Err(e) => {
            // Nothing resumes from a partial file, so don't leave one behind.
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
    };

    if output.exists() {
        fs::remove_file(output)?;
    }
    fs::rename(&partial, output)?;

    tracing::info!(file = %output.display(), bytes = byte_count, "Downloaded");
    Ok(byte_count)
}
