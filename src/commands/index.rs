use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::{debug, info, warn};

use crate::cli::IndexArgs;
use crate::commands::{default_db_path, default_inventory_path, inventory};
use crate::model::{ReportDocument, ReportEntry, ReportInventoryManifest};
use crate::report::loader::load_report;
use crate::report::view::organization_name;
use crate::util::{now_utc_string, read_json, write_json_pretty};

pub const CATALOG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexCounts {
    pub indexed: usize,
    pub unchanged: usize,
    pub pruned: usize,
}

pub fn run(args: IndexArgs) -> Result<()> {
    let inventory_path = default_inventory_path(&args.runs_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.runs_root));

    info!(runs_root = %args.runs_root.display(), "starting catalog index");

    let inventory =
        load_or_refresh_inventory(&args.runs_root, &inventory_path, args.refresh_inventory)?;

    let mut connection = open_catalog(&db_path)?;
    let counts = index_reports(&mut connection, &args.runs_root, &inventory)?;

    info!(
        path = %db_path.display(),
        indexed = counts.indexed,
        unchanged = counts.unchanged,
        pruned = counts.pruned,
        "catalog index completed"
    );
    Ok(())
}

fn load_or_refresh_inventory(
    runs_root: &Path,
    inventory_path: &Path,
    refresh: bool,
) -> Result<ReportInventoryManifest> {
    if !refresh && inventory_path.exists() {
        return read_json(inventory_path);
    }

    let manifest = inventory::build_manifest(runs_root)?;
    write_json_pretty(inventory_path, &manifest)?;
    info!(path = %inventory_path.display(), "refreshed inventory manifest");
    Ok(manifest)
}

pub fn open_catalog(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
          report_id TEXT PRIMARY KEY,
          relative_path TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          organization_name TEXT NOT NULL,
          analysis_date TEXT,
          overall_score REAL NOT NULL DEFAULT 0,
          total_pages INTEGER NOT NULL DEFAULT 0,
          page_count INTEGER NOT NULL DEFAULT 0,
          indexed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS report_issues (
          report_id TEXT NOT NULL,
          position INTEGER NOT NULL,
          issue TEXT NOT NULL,
          PRIMARY KEY(report_id, position),
          FOREIGN KEY(report_id) REFERENCES reports(report_id)
        );

        CREATE TABLE IF NOT EXISTS report_recommendations (
          report_id TEXT NOT NULL,
          position INTEGER NOT NULL,
          recommendation TEXT NOT NULL,
          PRIMARY KEY(report_id, position),
          FOREIGN KEY(report_id) REFERENCES reports(report_id)
        );

        CREATE INDEX IF NOT EXISTS idx_report_issues_issue ON report_issues(issue);
        CREATE INDEX IF NOT EXISTS idx_report_recommendations_text
          ON report_recommendations(recommendation);
        ",
        )
        .context("failed to create catalog schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![CATALOG_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Brings the catalog in line with the inventory, reloading only reports whose hash changed.
pub fn index_reports(
    connection: &mut Connection,
    runs_root: &Path,
    inventory: &ReportInventoryManifest,
) -> Result<IndexCounts> {
    let mut counts = IndexCounts::default();
    let tx = connection.transaction()?;

    for entry in &inventory.reports {
        if stored_sha256(&tx, &entry.report_id)?.as_deref() == Some(entry.sha256.as_str()) {
            debug!(report_id = %entry.report_id, "report unchanged");
            counts.unchanged += 1;
            continue;
        }

        let document = match load_report(runs_root, &entry.report_id) {
            Ok(document) => document,
            Err(err) => {
                warn!(report_id = %entry.report_id, error = %err, "skipping unreadable report");
                continue;
            }
        };
        upsert_report(&tx, entry, &document)?;
        counts.indexed += 1;
    }

    counts.pruned = prune_missing(&tx, inventory)?;

    tx.execute(
        "INSERT INTO metadata(key, value) VALUES('last_indexed_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![now_utc_string()],
    )?;
    tx.commit()?;
    Ok(counts)
}

fn stored_sha256(tx: &Transaction<'_>, report_id: &str) -> Result<Option<String>> {
    let sha256 = tx
        .query_row(
            "SELECT sha256 FROM reports WHERE report_id = ?1",
            params![report_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(sha256)
}

fn upsert_report(tx: &Transaction<'_>, entry: &ReportEntry, document: &ReportDocument) -> Result<()> {
    let summary = document.overall_summary.clone().unwrap_or_default();
    let analysis_date = document
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.generated_at.clone())
        .or_else(|| document.timestamp.clone())
        .or_else(|| document.analysis_date.clone());
    let total_pages = summary
        .total_pages_analyzed
        .unwrap_or(document.page_analyses.len());

    tx.execute(
        "
        INSERT INTO reports(report_id, relative_path, sha256, organization_name, analysis_date,
                            overall_score, total_pages, page_count, indexed_at)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(report_id) DO UPDATE SET
          relative_path=excluded.relative_path,
          sha256=excluded.sha256,
          organization_name=excluded.organization_name,
          analysis_date=excluded.analysis_date,
          overall_score=excluded.overall_score,
          total_pages=excluded.total_pages,
          page_count=excluded.page_count,
          indexed_at=excluded.indexed_at
        ",
        params![
            &entry.report_id,
            &entry.relative_path,
            &entry.sha256,
            organization_name(document, &entry.report_id),
            analysis_date,
            summary.overall_score.unwrap_or(0.0),
            total_pages as i64,
            document.page_analyses.len() as i64,
            now_utc_string(),
        ],
    )?;

    replace_ranked_rows(
        tx,
        "report_issues",
        "issue",
        &entry.report_id,
        &summary.most_critical_issues,
    )?;
    replace_ranked_rows(
        tx,
        "report_recommendations",
        "recommendation",
        &entry.report_id,
        &summary.top_recommendations,
    )?;

    debug!(
        report_id = %entry.report_id,
        issues = summary.most_critical_issues.len(),
        recommendations = summary.top_recommendations.len(),
        "indexed report"
    );
    Ok(())
}

fn replace_ranked_rows(
    tx: &Transaction<'_>,
    table: &str,
    column: &str,
    report_id: &str,
    values: &[String],
) -> Result<()> {
    tx.execute(
        &format!("DELETE FROM {table} WHERE report_id = ?1"),
        params![report_id],
    )?;

    let mut statement = tx.prepare(&format!(
        "INSERT INTO {table}(report_id, position, {column}) VALUES(?1, ?2, ?3)"
    ))?;
    for (position, value) in values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .enumerate()
    {
        statement.execute(params![report_id, position as i64, value])?;
    }
    Ok(())
}

fn prune_missing(tx: &Transaction<'_>, inventory: &ReportInventoryManifest) -> Result<usize> {
    let known: HashSet<&str> = inventory
        .reports
        .iter()
        .map(|entry| entry.report_id.as_str())
        .collect();

    let stored: Vec<String> = {
        let mut statement = tx.prepare("SELECT report_id FROM reports")?;
        let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut pruned = 0;
    for report_id in stored.iter().filter(|id| !known.contains(id.as_str())) {
        for table in ["report_issues", "report_recommendations", "reports"] {
            tx.execute(
                &format!("DELETE FROM {table} WHERE report_id = ?1"),
                params![report_id],
            )?;
        }
        info!(report_id = %report_id, "pruned report missing from inventory");
        pruned += 1;
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::report::loader::REPORT_FILE_NAME;

    fn write_report(root: &Path, report_id: &str, score: f64, issues: &[&str]) {
        let dir = root.join(report_id);
        fs::create_dir_all(&dir).expect("create run dir");
        let body = serde_json::json!({
            "organization": report_id,
            "overall_summary": {
                "executive_summary": "Summary.",
                "overall_score": score,
                "total_pages_analyzed": 3,
                "most_critical_issues": issues,
                "top_recommendations": ["Shorten forms"],
                "detailed_markdown_content": ""
            },
            "page_analyses": []
        });
        fs::write(dir.join(REPORT_FILE_NAME), body.to_string()).expect("write report");
    }

    fn catalog() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&connection).expect("schema");
        connection
    }

    fn count(connection: &Connection, sql: &str) -> i64 {
        connection
            .query_row(sql, [], |row| row.get(0))
            .expect("count query")
    }

    #[test]
    fn index_reports_skips_unchanged_and_reloads_changed() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_report(temp.path(), "acme", 7.0, &["Slow checkout", "Tiny fonts"]);
        write_report(temp.path(), "globex", 5.0, &["Slow checkout"]);
        let mut connection = catalog();

        let inventory = inventory::build_manifest(temp.path()).expect("inventory");
        let first = index_reports(&mut connection, temp.path(), &inventory).expect("first index");
        assert_eq!(first.indexed, 2);
        assert_eq!(count(&connection, "SELECT COUNT(*) FROM report_issues"), 3);

        let second = index_reports(&mut connection, temp.path(), &inventory).expect("second index");
        assert_eq!(second, IndexCounts { indexed: 0, unchanged: 2, pruned: 0 });

        write_report(temp.path(), "acme", 8.0, &["Tiny fonts"]);
        let inventory = inventory::build_manifest(temp.path()).expect("inventory");
        let third = index_reports(&mut connection, temp.path(), &inventory).expect("third index");
        assert_eq!(third.indexed, 1);
        assert_eq!(third.unchanged, 1);
        assert_eq!(count(&connection, "SELECT COUNT(*) FROM report_issues"), 2);
        let score: f64 = connection
            .query_row(
                "SELECT overall_score FROM reports WHERE report_id = 'acme'",
                [],
                |row| row.get(0),
            )
            .expect("score");
        assert_eq!(score, 8.0);
    }

    #[test]
    fn index_reports_prunes_reports_missing_from_inventory() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_report(temp.path(), "acme", 7.0, &["Slow checkout"]);
        write_report(temp.path(), "globex", 5.0, &[]);
        let mut connection = catalog();

        let inventory = inventory::build_manifest(temp.path()).expect("inventory");
        index_reports(&mut connection, temp.path(), &inventory).expect("index");

        fs::remove_dir_all(temp.path().join("acme")).expect("remove run");
        let inventory = inventory::build_manifest(temp.path()).expect("inventory");
        let counts = index_reports(&mut connection, temp.path(), &inventory).expect("reindex");

        assert_eq!(counts.pruned, 1);
        assert_eq!(count(&connection, "SELECT COUNT(*) FROM reports"), 1);
        assert_eq!(count(&connection, "SELECT COUNT(*) FROM report_issues"), 0);
    }

    #[test]
    fn ensure_schema_is_repeatable() {
        let connection = catalog();
        ensure_schema(&connection).expect("second schema pass");
        let version: String = connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .expect("schema version");
        assert_eq!(version, CATALOG_SCHEMA_VERSION);
    }
}
