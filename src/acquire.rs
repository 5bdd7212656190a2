//! Area extraction: submit, wait, download
use crate::aoi::{self, Aoi};
use crate::appeears::poll::wait_until_done;
use crate::appeears::task::{FileFormat, Task, TaskDate, TaskLayer, TaskOutput, TaskParams};
use crate::appeears::Provider;
use crate::config::Settings;
use crate::download_plan::generate_download_plan;
use crate::selection::{self, RequestSelection};
use crate::service::TaskService;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct AcquireOptions {
    pub aoi_path: PathBuf,
    pub selection_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
}

pub fn build_task(aoi: &Aoi, selection: &RequestSelection, task_name: &str) -> Result<Task> {
    selection.validate()?;

    let layers = selection
        .layers()?
        .into_iter()
        .map(|(product, layer)| TaskLayer { layer, product })
        .collect();

    let dates = &selection.dates;
    Ok(Task {
        task_type: selection.task_type.clone(),
        task_name: task_name.to_string(),
        params: TaskParams {
            dates: vec![TaskDate {
                start_date: dates.start.clone(),
                end_date: dates.end.clone(),
                recurring: dates.recurring,
                year_range: dates.year_range,
            }],
            layers,
            output: TaskOutput {
                format: FileFormat {
                    kind: selection.output.format.clone(),
                },
                projection: selection.output.projection.clone(),
            },
            geo: aoi.to_feature_collection(),
        },
    })
}

/// Everything after authentication: submit the task, wait for it, then fetch
/// its bundle into `<output_dir>/<task_name>`.
pub async fn submit_and_download(
    service: &impl TaskService,
    task: &Task,
    output_dir: &Path,
    poll_interval: Duration,
) -> Result<PathBuf> {
    let submission = service.submit(task).await?;
    let task_id = submission.task_id;
    tracing::info!(task_id = %task_id, task_name = %task.task_name, "Submitted task");

    wait_until_done(service, &task_id, poll_interval).await?;

    let dest_dir = output_dir.join(&task.task_name);
    fs::create_dir_all(&dest_dir)?;

    let bundle = service.bundle(&task_id).await?;
    let plan = generate_download_plan(&task_id, &bundle, &dest_dir);
    plan.write(dest_dir.join("download_plan.json"))?;
    let bytes = plan.execute(service).await?;

    tracing::info!(
        files = plan.tasks().len(),
        bytes,
        "Downloaded files can be found at: {}",
        dest_dir.display()
    );
    Ok(dest_dir)
}

pub async fn run(settings: &Settings, options: &AcquireOptions) -> Result<PathBuf> {
    let aoi = Aoi::read(&options.aoi_path)?;
    let selection = match &options.selection_path {
        Some(path) => RequestSelection::read(path)?,
        None => RequestSelection::from_template(&selection::template())?,
    };
    let task_name = aoi::task_name(&options.aoi_path, chrono::Local::now().date_naive());
    let task = build_task(&aoi, &selection, &task_name)?;

    let (username, password) = settings.credentials()?;
    let provider = Provider::login(settings.appeears_api.clone(), &username, &password).await?;

    let result =
        submit_and_download(&provider, &task, &options.output_dir, options.poll_interval).await;
    if let Err(e) = provider.logout().await {
        tracing::warn!(error = %e, "Logout failed");
    }
    result
}
