use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, warn};

use crate::model::{OverallSummary, ReportDocument};
use crate::util::read_json;

pub const REPORT_FILE_NAME: &str = "report-data.json";
pub const OVERVIEW_NOT_AVAILABLE_MARKDOWN: &str =
    "# Overview Not Available\n\nThe detailed overview content could not be loaded.";
const EXECUTIVE_SUMMARY_NOT_AVAILABLE: &str = "Executive summary not available.";

pub fn report_path(runs_root: &Path, report_id: &str) -> Result<PathBuf> {
    validate_report_id(report_id)?;
    Ok(runs_root.join(report_id).join(REPORT_FILE_NAME))
}

pub fn validate_report_id(report_id: &str) -> Result<()> {
    if report_id.trim().is_empty() {
        bail!("report id is empty");
    }
    if report_id.contains(['/', '\\']) || report_id == "." || report_id == ".." {
        bail!("report id must be a single directory name: {report_id}");
    }
    Ok(())
}

pub fn load_report(runs_root: &Path, report_id: &str) -> Result<ReportDocument> {
    let path = report_path(runs_root, report_id)?;
    debug!(path = %path.display(), "loading report document");
    let document: ReportDocument = read_json(&path)?;
    Ok(sanitize(document))
}

/// Fills the gaps an incomplete upstream document leaves so views never see a missing summary.
pub fn sanitize(mut document: ReportDocument) -> ReportDocument {
    let page_count = document.page_analyses.len();

    let summary = document.overall_summary.get_or_insert_with(|| {
        warn!("report document has no overall_summary; using placeholder");
        OverallSummary::default()
    });

    if summary.executive_summary.trim().is_empty() {
        summary.executive_summary = EXECUTIVE_SUMMARY_NOT_AVAILABLE.to_string();
    }
    if summary.overall_score.is_none() {
        summary.overall_score = Some(0.0);
    }
    if summary.total_pages_analyzed.is_none() {
        summary.total_pages_analyzed = Some(page_count);
    }
    if summary.detailed_markdown_content.trim().is_empty() {
        summary.detailed_markdown_content = OVERVIEW_NOT_AVAILABLE_MARKDOWN.to_string();
    }

    document
}
