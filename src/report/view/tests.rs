use super::*;
use crate::report::score::ScoreBucket;

fn parsers() -> ReportParsers {
    ReportParsers::new().expect("parsers compile")
}

fn sample_document() -> ReportDocument {
    let raw = r###"{
        "organization": "Acme Fallback",
        "timestamp": "2026-10-15T08:30:00Z",
        "metadata": {"organization_name": "Acme"},
        "overall_summary": {
            "executive_summary": "Acme converts well.",
            "overall_score": 7.2,
            "total_pages_analyzed": 0,
            "performance_summary": "Fast pages.",
            "detailed_markdown_content": "## Executive Summary\nAcme converts well.\nExtra context.\n## Overall Theme Assessment\nConsistent palette.\n## Key Findings\nStrong hero.\n### Goal Achievement Assessment\nGoals met.\n## Appendix\nRaw notes."
        },
        "page_analyses": [
            {
                "id": "home",
                "url": "https://acme.test/",
                "title": "Home",
                "page_type": "Homepage",
                "overall_score": 8,
                "section_scores": {"visual_design": 9, "goal_alignment": "?"},
                "detailed_analysis": "PAGE ROLE: Primary entry point\n## 1. Visual Design (Score: 6/10)\nSUMMARY: Polished\n## 2. Goal Alignment (Score: 4/10)"
            },
            {
                "id": "pricing",
                "url": "https://acme.test/pricing",
                "title": "",
                "page_type": "Pricing Page",
                "overall_score": 5,
                "sections": [{"name": "custom", "title": "Custom", "score": null}]
            }
        ]
    }"###;
    serde_json::from_str(raw).expect("sample document parses")
}

#[test]
fn overview_lists_known_tabs_in_fixed_order() {
    let view = OverviewView::build("acme-1", &sample_document(), &parsers());

    let keys: Vec<&str> = view.tabs.iter().map(|tab| tab.key).collect();
    assert_eq!(keys, vec!["key-findings", "overall-theme-assessment"]);
    assert!(view.has_detailed_overview());
    assert!(view.sections.contains("appendix"));
    assert_eq!(view.goal_achievement, "Goals met.");
}

#[test]
fn overview_resolves_names_dates_and_scores() {
    let view = OverviewView::build("acme-1", &sample_document(), &parsers());

    assert_eq!(view.organization_name, "Acme");
    assert_eq!(view.analysis_date_display, "October 15, 2026");
    assert_eq!(view.overall.bucket, ScoreBucket::Green);
    assert_eq!(view.overall.status_text, "Good");
    assert_eq!(view.total_pages_analyzed, 2);
    assert_eq!(view.site_score_explanation, "Not available.");
    assert_eq!(
        view.sections
            .get("executive-summary")
            .map(|section| section.content.as_str()),
        Some("Extra context.")
    );
    assert_eq!(view.pages.len(), 2);
}

#[test]
fn overview_without_sections_has_no_detailed_tabs() {
    let document = crate::report::loader::sanitize(ReportDocument::default());
    let view = OverviewView::build("empty", &document, &parsers());

    assert!(!view.has_detailed_overview());
    assert!(view.sections.is_empty());
    assert_eq!(view.organization_name, "Report ID: empty");
}

#[test]
fn page_view_parses_sections_with_table_priority() {
    let view = PageView::build("acme-1", &sample_document(), "home", &parsers())
        .expect("home page exists");

    let scores: Vec<(&str, f64)> = view
        .sections
        .iter()
        .map(|section| (section.section.title.as_str(), section.section.score))
        .collect();
    assert_eq!(scores, vec![("Visual Design", 9.0), ("Goal Alignment", 4.0)]);
    assert_eq!(view.sections[0].badge.bucket, ScoreBucket::Emerald);
    assert_eq!(view.page_role, "Primary entry point");
    assert!(!view.page_role_is_fallback);
    assert_eq!(view.display_name, "Home");

    let labels: Vec<(&str, Option<f64>)> = view
        .section_scores
        .iter()
        .map(|row| (row.label.as_str(), row.score))
        .collect();
    assert_eq!(
        labels,
        vec![("Goal Alignment", None), ("Visual Design", Some(9.0))]
    );
}

#[test]
fn page_view_uses_upstream_sections_and_fallback_role() {
    let view = PageView::build("acme-1", &sample_document(), "pricing", &parsers())
        .expect("pricing page exists");

    assert_eq!(view.sections.len(), 1);
    assert_eq!(view.sections[0].section.score, 5.0);
    assert!(view.page_role_is_fallback);
    assert!(view.page_role.contains("pricing page for Acme's website"));
    assert_eq!(view.display_name, "Pricing");
}

#[test]
fn page_view_rejects_unknown_page() {
    let err = PageView::build("acme-1", &sample_document(), "nope", &parsers())
        .expect_err("unknown page fails");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn blank_names_and_dates_fall_through_to_the_next_candidate() {
    let document: ReportDocument = serde_json::from_str(
        r#"{
            "organization": "Acme",
            "timestamp": "2026-03-02",
            "metadata": {"organization_name": "  ", "generated_at": ""},
            "page_analyses": [{"id": "home", "url": "https://acme.test/", "page_type": "Homepage"}]
        }"#,
    )
    .expect("document parses");

    let view = OverviewView::build("acme-1", &document, &parsers());
    assert_eq!(view.organization_name, "Acme");
    assert_eq!(view.analysis_date, "2026-03-02");

    let page = PageView::build("acme-1", &document, "home", &parsers()).expect("home page");
    assert!(page.page_role.contains("homepage for Acme's website"));
}

#[test]
fn fallback_role_without_organization_names_the_organization_generically() {
    let document: ReportDocument = serde_json::from_str(
        r#"{"page_analyses": [{"id": "home", "url": "https://acme.test/", "page_type": "Homepage"}]}"#,
    )
    .expect("document parses");

    let page = PageView::build("acme-1", &document, "home", &parsers()).expect("home page");
    assert_eq!(page.organization_name, "Report ID: acme-1");
    assert!(page.page_role.contains("homepage for the organization's website"));
    assert!(!page.page_role.contains("Report ID"));
}
