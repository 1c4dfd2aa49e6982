use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::InventoryArgs;
use crate::commands::default_inventory_path;
use crate::model::{ReportEntry, ReportInventoryManifest};
use crate::report::loader::REPORT_FILE_NAME;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.runs_root)?;

    if args.dry_run {
        info!(
            report_count = manifest.report_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_inventory_path(&args.runs_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(report_count = manifest.report_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(runs_root: &Path) -> Result<ReportInventoryManifest> {
    let report_dirs = discover_report_dirs(runs_root)?;

    if report_dirs.is_empty() {
        bail!("no {REPORT_FILE_NAME} files found in {}", runs_root.display());
    }

    let mut reports = Vec::with_capacity(report_dirs.len());
    for (report_id, dir) in report_dirs {
        let path = dir.join(REPORT_FILE_NAME);
        let byte_size = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let sha256 = sha256_file(&path)?;

        debug!(report_id = %report_id, byte_size, "inventoried report");
        reports.push(ReportEntry {
            relative_path: format!("{report_id}/{REPORT_FILE_NAME}"),
            report_id,
            sha256,
            byte_size,
        });
    }

    Ok(ReportInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: runs_root.display().to_string(),
        report_count: reports.len(),
        reports,
    })
}

/// Run directories holding a report document, sorted by report id.
fn discover_report_dirs(runs_root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs = Vec::new();

    let entries = fs::read_dir(runs_root)
        .with_context(|| format!("failed to read {}", runs_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", runs_root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_dir()
        {
            continue;
        }

        if !path.join(REPORT_FILE_NAME).is_file() {
            continue;
        }

        let report_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 directory name: {}", path.display()))?;

        dirs.push((report_id, path));
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}
