pub mod poller;
pub mod screenshots;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::util::read_json;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    UrlDiscovery,
    ScreenshotCapture,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::UrlDiscovery => "url_discovery",
            Self::ScreenshotCapture => "screenshot_capture",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Capture,
    Analysis,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Analysis => "analysis",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Capture => "Capture failed",
            Self::Analysis => "Analysis failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub url: String,
    pub success: bool,
    #[serde(default)]
    pub data: Option<ScreenshotData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub data_url: Option<String>,
    #[serde(default)]
    pub custom_page_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub results: Option<JobResults>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Where a poller reads job snapshots from.
pub trait StatusSource {
    fn fetch(&mut self) -> Result<JobSnapshot>;
}

/// Reads the job status document the capture or analysis service keeps on disk.
#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSource for FileStatusSource {
    fn fetch(&mut self) -> Result<JobSnapshot> {
        read_json(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_deserializes_capture_service_document() {
        let raw = r#"{
            "id": "job-7",
            "status": "screenshot_capture",
            "progress": {"stage": "capture", "percentage": 40, "message": "3 of 8"},
            "results": {
                "screenshots": [
                    {"url": "https://acme.test/", "success": true,
                     "data": {"path": "desktop/home.png", "isCustom": false}}
                ],
                "urls": ["https://acme.test/"]
            }
        }"#;

        let snapshot: JobSnapshot = serde_json::from_str(raw).expect("snapshot parses");
        assert_eq!(snapshot.status, JobStatus::ScreenshotCapture);
        assert!(!snapshot.status.is_terminal());
        assert_eq!(snapshot.progress.percentage, 40.0);
        let results = snapshot.results.expect("results present");
        assert_eq!(
            results.screenshots[0]
                .data
                .as_ref()
                .and_then(|data| data.path.as_deref()),
            Some("desktop/home.png")
        );
    }

    #[test]
    fn terminal_statuses_are_completed_and_failed() {
        let terminal: Vec<JobStatus> = [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::UrlDiscovery,
            JobStatus::ScreenshotCapture,
            JobStatus::Completed,
            JobStatus::Failed,
        ]
        .into_iter()
        .filter(|status| status.is_terminal())
        .collect();
        assert_eq!(terminal, vec![JobStatus::Completed, JobStatus::Failed]);
    }
}
