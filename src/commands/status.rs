use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{default_db_path, default_inventory_path};
use crate::model::ReportInventoryManifest;
use crate::util::{read_json, write_json_stdout};

const TOP_ITEM_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub text: String,
    pub report_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_reports: i64,
    pub avg_score: f64,
    pub total_pages_analyzed: i64,
    pub top_issues: Vec<RankedItem>,
    pub top_recommendations: Vec<RankedItem>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = default_inventory_path(&args.runs_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.runs_root));

    info!(runs_root = %args.runs_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: ReportInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            report_count = inventory.report_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "catalog database missing; run `index` first");
        return Ok(());
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let stats = dashboard_stats(&conn)?;
    let last_indexed_at = query_metadata(&conn, "last_indexed_at").unwrap_or_default();

    info!(
        path = %db_path.display(),
        reports = stats.total_reports,
        last_indexed_at = %last_indexed_at,
        "catalog status"
    );

    if args.json {
        return write_json_stdout(&stats);
    }
    render_stats(&stats)
}

pub fn dashboard_stats(conn: &Connection) -> Result<DashboardStats> {
    let total_reports = query_count(conn, "SELECT COUNT(*) FROM reports")?;
    let avg_score: Option<f64> = conn
        .query_row("SELECT AVG(overall_score) FROM reports", [], |row| row.get(0))
        .context("failed to compute average score")?;
    let total_pages_analyzed =
        query_count(conn, "SELECT COALESCE(SUM(total_pages), 0) FROM reports")?;

    Ok(DashboardStats {
        total_reports,
        avg_score: avg_score.map_or(0.0, |score| (score * 10.0).round() / 10.0),
        total_pages_analyzed,
        top_issues: top_items(conn, "report_issues", "issue")?,
        top_recommendations: top_items(conn, "report_recommendations", "recommendation")?,
    })
}

fn top_items(conn: &Connection, table: &str, column: &str) -> Result<Vec<RankedItem>> {
    let mut statement = conn.prepare(&format!(
        "SELECT {column}, COUNT(DISTINCT report_id) AS report_count
         FROM {table}
         GROUP BY {column}
         ORDER BY report_count DESC, {column} ASC
         LIMIT ?1"
    ))?;
    let rows = statement.query_map([TOP_ITEM_LIMIT as i64], |row| {
        Ok(RankedItem {
            text: row.get(0)?,
            report_count: row.get(1)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to rank {table}"))
}

fn render_stats(stats: &DashboardStats) -> Result<()> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    writeln!(out, "Total reports:         {}", stats.total_reports)?;
    writeln!(out, "Average score:         {:.1}", stats.avg_score)?;
    writeln!(out, "Total pages analyzed:  {}", stats.total_pages_analyzed)?;
    for (heading, items) in [
        ("Top issues", &stats.top_issues),
        ("Top recommendations", &stats.top_recommendations),
    ] {
        writeln!(out)?;
        writeln!(out, "{heading}:")?;
        if items.is_empty() {
            writeln!(out, "  (none)")?;
        }
        for item in items {
            writeln!(out, "  {:>3}  {}", item.report_count, item.text)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn query_metadata(conn: &Connection, key: &str) -> Result<String> {
    let value = conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
        row.get(0)
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use rusqlite::params;

    use super::*;
    use crate::commands::index::ensure_schema;

    fn seeded_catalog() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&conn).expect("schema");
        for (id, score, pages) in [("acme", 7.0, 4), ("globex", 5.5, 6), ("initech", 8.0, 2)] {
            conn.execute(
                "INSERT INTO reports(report_id, relative_path, sha256, organization_name,
                                     overall_score, total_pages, page_count, indexed_at)
                 VALUES(?1, ?2, 'x', ?1, ?3, ?4, ?4, 'now')",
                params![id, format!("{id}/report-data.json"), score, pages],
            )
            .expect("insert report");
        }
        let issues = [
            ("acme", "Slow checkout"),
            ("globex", "Slow checkout"),
            ("initech", "Slow checkout"),
            ("acme", "Tiny fonts"),
            ("globex", "Tiny fonts"),
            ("acme", "A"),
            ("acme", "B"),
            ("acme", "C"),
            ("acme", "D"),
        ];
        for (position, (id, issue)) in issues.iter().enumerate() {
            conn.execute(
                "INSERT INTO report_issues(report_id, position, issue) VALUES(?1, ?2, ?3)",
                params![id, position as i64, issue],
            )
            .expect("insert issue");
        }
        conn
    }

    #[test]
    fn dashboard_stats_aggregate_catalog() {
        let stats = dashboard_stats(&seeded_catalog()).expect("stats");

        assert_eq!(stats.total_reports, 3);
        assert_eq!(stats.avg_score, 6.8);
        assert_eq!(stats.total_pages_analyzed, 12);
        let issues: Vec<(&str, i64)> = stats
            .top_issues
            .iter()
            .map(|item| (item.text.as_str(), item.report_count))
            .collect();
        assert_eq!(
            issues,
            vec![("Slow checkout", 3), ("Tiny fonts", 2), ("A", 1), ("B", 1), ("C", 1)]
        );
        assert!(stats.top_recommendations.is_empty());
    }

    #[test]
    fn dashboard_stats_on_empty_catalog() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&conn).expect("schema");

        let stats = dashboard_stats(&conn).expect("stats");
        assert_eq!(stats.total_reports, 0);
        assert_eq!(stats.avg_score, 0.0);
        assert_eq!(stats.total_pages_analyzed, 0);
    }
}
