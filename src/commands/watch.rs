use std::io::{BufWriter, Write};
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::info;

use crate::cli::WatchArgs;
use crate::jobs::poller::{PollOutcome, Poller};
use crate::jobs::screenshots::screenshot_url;
use crate::jobs::{FileStatusSource, JobKind, JobSnapshot};
use crate::util::write_json_stdout;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedScreenshot {
    pub page_url: String,
    pub success: bool,
    pub image_url: String,
    pub custom_page_name: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedJob {
    pub job_id: String,
    pub report_path: Option<String>,
    pub screenshots: Vec<ResolvedScreenshot>,
}

pub fn run(args: WatchArgs) -> Result<()> {
    let kind = JobKind::from(args.kind);
    let mut source = FileStatusSource::new(&args.status_path);
    let mut poller =
        Poller::new(kind, Duration::from_millis(args.interval_ms)).with_max_polls(args.max_polls);

    info!(
        kind = kind.as_str(),
        path = %source.path().display(),
        "watching job status"
    );

    let outcome = poller.run(&mut source, |snapshot| {
        info!(
            job_id = %snapshot.id,
            status = %snapshot.status,
            stage = %snapshot.progress.stage,
            percentage = snapshot.progress.percentage,
            message = %snapshot.progress.message,
            "job progress"
        );
    })?;

    match outcome {
        PollOutcome::Completed(snapshot) => {
            let completed = completed_job(&snapshot, &args.capture_base_url);
            info!(
                job_id = %completed.job_id,
                screenshots = completed.screenshots.len(),
                "{} job completed",
                kind.as_str()
            );
            if args.json {
                return write_json_stdout(&completed);
            }
            render_completed(&completed)
        }
        PollOutcome::Failed { snapshot, message } => {
            bail!("{} job {} failed: {message}", kind.as_str(), snapshot.id)
        }
        PollOutcome::Exhausted { polls } => {
            bail!("{} job still running after {polls} polls", kind.as_str())
        }
        PollOutcome::Pending(_) | PollOutcome::Unavailable => {
            bail!("{} job polling stopped before a terminal status", kind.as_str())
        }
    }
}

pub fn completed_job(snapshot: &JobSnapshot, base_url: &str) -> CompletedJob {
    let results = snapshot.results.clone().unwrap_or_default();
    CompletedJob {
        job_id: snapshot.id.clone(),
        report_path: results.report_path,
        screenshots: results
            .screenshots
            .iter()
            .map(|screenshot| ResolvedScreenshot {
                page_url: screenshot.url.clone(),
                success: screenshot.success,
                image_url: screenshot_url(screenshot, &snapshot.id, base_url),
                custom_page_name: screenshot
                    .data
                    .as_ref()
                    .and_then(|data| data.custom_page_name.clone()),
                error: screenshot.error.clone(),
            })
            .collect(),
    }
}

fn render_completed(completed: &CompletedJob) -> Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    writeln!(out, "Job {} completed", completed.job_id)?;
    if let Some(report_path) = completed.report_path.as_deref() {
        writeln!(out, "Report: {report_path}")?;
    }
    for screenshot in &completed.screenshots {
        let marker = if screenshot.success { "ok" } else { "failed" };
        writeln!(
            out,
            "  [{marker}] {} -> {}",
            screenshot.page_url, screenshot.image_url
        )?;
    }
    out.flush()?;
    Ok(())
}
