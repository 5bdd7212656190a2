use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),
    #[error("Task {0} was reported as failed by the service")]
    TaskFailed(String),
    #[error("Task {task_id} reported unrecognised status '{status}'")]
    UnexpectedStatus { task_id: String, status: String },
    #[error("No site information returned for site {0}")]
    SiteNotFound(String),
    #[error("Invalid USGS site code: {0}")]
    InvalidSiteCode(String),
    #[error("Number of US states must be 48 or 50, got {0}")]
    InvalidStateCount(u32),
    #[error("Invalid date '{value}', expected {format}")]
    InvalidDate { value: String, format: &'static str },
    #[error("No layers selected for download")]
    NoLayers,
}
