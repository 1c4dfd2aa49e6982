use std::io::{BufWriter, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::OverviewArgs;
use crate::report::ReportParsers;
use crate::report::loader::load_report;
use crate::report::overview::KEY_FINDINGS_KEY;
use crate::report::view::OverviewView;
use crate::util::write_json_stdout;

pub fn run(args: OverviewArgs) -> Result<()> {
    let parsers = ReportParsers::new()?;
    let document = load_report(&args.runs_root, &args.report_id)?;
    let view = OverviewView::build(&args.report_id, &document, &parsers);

    info!(
        report_id = %args.report_id,
        tabs = view.tabs.len(),
        pages = view.pages.len(),
        "rendering overview"
    );

    if args.json {
        return write_json_stdout(&view);
    }

    let mut out = BufWriter::new(std::io::stdout().lock());
    render_overview(&mut out, &view)?;
    out.flush()?;
    Ok(())
}

pub fn render_overview<W: Write>(out: &mut W, view: &OverviewView) -> Result<()> {
    writeln!(out, "{}", view.organization_name)?;
    writeln!(out, "Analysis date: {}", view.analysis_date_display)?;
    writeln!(
        out,
        "Overall score: {:.1}/10 ({})",
        view.overall.score, view.overall.status_text
    )?;
    writeln!(out, "Pages analyzed: {}", view.total_pages_analyzed)?;

    write_block(out, "Executive Summary", &view.executive_summary)?;
    write_block(out, "Site Score Explanation", &view.site_score_explanation)?;
    write_list(out, "Most Critical Issues", &view.most_critical_issues)?;
    write_list(out, "Top Recommendations", &view.top_recommendations)?;
    write_list(out, "Key Strengths", &view.key_strengths)?;

    if !view.has_detailed_overview() {
        writeln!(out)?;
        writeln!(out, "Detailed Overview Not Available")?;
        writeln!(
            out,
            "The comprehensive markdown content could not be loaded or parsed correctly."
        )?;
    }

    for tab in &view.tabs {
        let Some(section) = view.sections.get(tab.key) else {
            continue;
        };
        writeln!(out)?;
        writeln!(out, "== {} ==", tab.title)?;
        if !section.content.is_empty() {
            writeln!(out, "{}", section.content)?;
        }
        for subsection in &section.subsections {
            writeln!(out)?;
            writeln!(out, "-- {} --", subsection.title)?;
            writeln!(out, "{}", subsection.content)?;
        }
        if tab.key == KEY_FINDINGS_KEY {
            write_block(out, "Performance Summary", &view.performance_summary)?;
            if !view.goal_achievement.is_empty() {
                write_block(out, "Goal Achievement Assessment", &view.goal_achievement)?;
            }
        }
    }

    if !view.pages.is_empty() {
        writeln!(out)?;
        writeln!(out, "Page-by-Page Analysis")?;
        for page in &view.pages {
            writeln!(
                out,
                "  [{:>4.1}] {:<24} {}",
                page.score.score, page.id, page.url
            )?;
        }
    }
    Ok(())
}

fn write_block<W: Write>(out: &mut W, heading: &str, body: &str) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{heading}")?;
    writeln!(out, "{body}")?;
    Ok(())
}

fn write_list<W: Write>(out: &mut W, heading: &str, items: &[String]) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{heading}")?;
    for item in items {
        writeln!(out, "  - {item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportDocument;
    use crate::report::loader::sanitize;

    fn render(document: &ReportDocument) -> String {
        let parsers = ReportParsers::new().expect("parsers compile");
        let view = OverviewView::build("acme-1", document, &parsers);
        let mut buffer = Vec::new();
        render_overview(&mut buffer, &view).expect("render");
        String::from_utf8(buffer).expect("utf8 output")
    }

    #[test]
    fn render_overview_shows_key_findings_with_goal_assessment() {
        let document: ReportDocument = serde_json::from_str(
            r###"{
                "organization": "Acme",
                "timestamp": "2026-10-15",
                "overall_summary": {
                    "executive_summary": "Solid.",
                    "overall_score": 8.4,
                    "most_critical_issues": ["Slow checkout"],
                    "detailed_markdown_content": "## Key Findings\nStrong hero.\n### Goal Achievement Assessment\nGoals met."
                }
            }"###,
        )
        .expect("document parses");

        let text = render(&sanitize(document));
        assert!(text.starts_with("Acme\nAnalysis date: October 15, 2026\n"));
        assert!(text.contains("Overall score: 8.4/10 (Excellent)"));
        assert!(text.contains("  - Slow checkout"));
        assert!(text.contains("== Key Findings ==\nStrong hero."));
        assert!(text.contains("Goal Achievement Assessment\nGoals met."));
        assert!(!text.contains("Detailed Overview Not Available"));
    }

    #[test]
    fn render_overview_without_markdown_reports_missing_detail() {
        let text = render(&sanitize(ReportDocument::default()));
        assert!(text.contains("Report ID: acme-1"));
        assert!(text.contains("Detailed Overview Not Available"));
        assert!(text.contains("Executive summary not available."));
    }
}
