use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request body for `POST task`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub task_type: String,
    pub task_name: String,
    pub params: TaskParams,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskParams {
    pub dates: Vec<TaskDate>,
    pub layers: Vec<TaskLayer>,
    pub output: TaskOutput,
    pub geo: FeatureCollection,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDate {
    pub start_date: String,
    pub end_date: String,
    pub recurring: bool,
    pub year_range: [i32; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskLayer {
    pub layer: String,
    pub product: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub format: FileFormat,
    pub projection: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TaskSubmission {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TaskStatus {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: Status,
}

/// Task state as reported by the service. States this client does not know
/// about are kept verbatim.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String")]
pub enum Status {
    Queued,
    Pending,
    Processing,
    Done,
    Error,
    Other(String),
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => Self::Queued,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "done" => Self::Done,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
            Self::Other(other) => other.as_str(),
        };
        write!(f, "{}", s)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Bundle {
    #[serde(default)]
    pub task_id: Option<String>,
    pub files: Vec<BundleFile>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BundleFile {
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl BundleFile {
    /// GeoTIFF outputs are nested one directory deep in the bundle; they are
    /// saved flat using their second path segment. Everything else keeps its
    /// bundle name.
    pub fn local_name(&self) -> &str {
        if self.file_name.ends_with(".tif") {
            if let Some(name) = self.file_name.split('/').nth(1) {
                return name;
            }
        }
        &self.file_name
    }
}
