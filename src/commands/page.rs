use std::io::{BufWriter, Write};

use anyhow::Result;
use tracing::info;

use crate::cli::PageArgs;
use crate::report::ReportParsers;
use crate::report::loader::load_report;
use crate::report::view::PageView;
use crate::util::write_json_stdout;

pub fn run(args: PageArgs) -> Result<()> {
    let parsers = ReportParsers::new()?;
    let document = load_report(&args.runs_root, &args.report_id)?;
    let view = PageView::build(&args.report_id, &document, &args.page_id, &parsers)?;

    info!(
        report_id = %args.report_id,
        page_id = %args.page_id,
        sections = view.sections.len(),
        "rendering page"
    );

    if args.json {
        return write_json_stdout(&view);
    }

    let mut out = BufWriter::new(std::io::stdout().lock());
    render_page(&mut out, &view)?;
    out.flush()?;
    Ok(())
}

pub fn render_page<W: Write>(out: &mut W, view: &PageView) -> Result<()> {
    writeln!(out, "{} ({})", view.display_name, view.organization_name)?;
    writeln!(out, "URL: {}", view.url)?;
    if !view.page_type.is_empty() {
        writeln!(out, "Type: {}", view.page_type)?;
    }
    writeln!(
        out,
        "Score: {:.1}/10 ({})",
        view.overall.score, view.overall.status_text
    )?;
    if let Some(explanation) = view.overall_explanation.as_deref() {
        writeln!(out, "{explanation}")?;
    }

    writeln!(out)?;
    writeln!(out, "Page Role")?;
    writeln!(out, "{}", view.page_role)?;

    if !view.summary.is_empty() {
        writeln!(out)?;
        writeln!(out, "Summary")?;
        writeln!(out, "{}", view.summary)?;
    }

    if !view.section_scores.is_empty() {
        writeln!(out)?;
        writeln!(out, "Section Scores")?;
        for row in &view.section_scores {
            match row.score {
                Some(score) => writeln!(out, "  {:<32} {score:.1}", row.label)?,
                None => writeln!(out, "  {:<32} n/a", row.label)?,
            }
        }
    }

    for section in &view.sections {
        let section_data = &section.section;
        writeln!(out)?;
        writeln!(
            out,
            "== {} [{:.1}/10, {}] ==",
            section_data.title,
            section_data.score,
            section.badge.bucket.as_str()
        )?;
        if let Some(summary) = section_data.summary.as_deref() {
            writeln!(out, "{summary}")?;
        }
        for point in &section_data.points {
            writeln!(out, "  - {point}")?;
        }
        if let Some(evidence) = section_data.evidence.as_deref() {
            writeln!(out, "Evidence: {evidence}")?;
        }
        if let Some(explanation) = section_data.score_explanation.as_deref() {
            writeln!(out, "Score explanation: {explanation}")?;
        }
    }

    if !view.key_issues.is_empty() {
        writeln!(out)?;
        writeln!(out, "Key Issues")?;
        for issue in &view.key_issues {
            writeln!(out, "  - {}", issue.issue)?;
            if let Some(fix) = issue.how_to_fix.as_deref() {
                writeln!(out, "    Fix: {fix}")?;
            }
        }
    }

    if !view.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recommendations")?;
        for recommendation in &view.recommendations {
            writeln!(out, "  - {}", recommendation.recommendation)?;
            if let Some(benefit) = recommendation.benefit.as_deref() {
                writeln!(out, "    Benefit: {benefit}")?;
            }
        }
    }
    Ok(())
}
