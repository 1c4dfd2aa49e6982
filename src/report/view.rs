use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

use crate::model::{PageAnalysis, PageIssue, PageRecommendation, PageSection, ReportDocument};
use crate::report::ReportParsers;
use crate::report::display::{format_section_name, page_display_name};
use crate::report::overview::{EXECUTIVE_SUMMARY_KEY, SectionTree};
use crate::report::page_role::{extract_page_role, fallback_page_role};
use crate::report::score::{ScoreBadge, ScoreScale};
use crate::util::{format_display_date, now_utc_string};

/// Detail tabs in display order; other parsed sections are not shown as tabs.
pub const DETAIL_SECTIONS: [(&str, &str); 4] = [
    ("key-findings", "Key Findings"),
    ("strategic-recommendations", "Strategic Recommendations"),
    ("overall-theme-assessment", "Overall Theme Assessment"),
    ("implementation-roadmap", "Implementation Roadmap"),
];

#[derive(Debug, Clone, Serialize)]
pub struct DetailTab {
    pub key: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageCard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: ScoreBadge,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub report_id: String,
    pub organization_name: String,
    pub analysis_date: String,
    pub analysis_date_display: String,
    pub overall: ScoreBadge,
    pub site_score_explanation: String,
    pub total_pages_analyzed: usize,
    pub executive_summary: String,
    pub performance_summary: String,
    pub most_critical_issues: Vec<String>,
    pub top_recommendations: Vec<String>,
    pub key_strengths: Vec<String>,
    pub sections: SectionTree,
    pub goal_achievement: String,
    pub tabs: Vec<DetailTab>,
    pub pages: Vec<PageCard>,
}

impl OverviewView {
    pub fn build(report_id: &str, document: &ReportDocument, parsers: &ReportParsers) -> Self {
        let summary = document.overall_summary.clone().unwrap_or_default();
        let executive_summary = non_blank_or(&summary.executive_summary, "Not available.");
        let overview = parsers
            .overview
            .parse(&summary.detailed_markdown_content, &executive_summary);

        let tabs: Vec<DetailTab> = DETAIL_SECTIONS
            .iter()
            .filter(|(key, _)| *key != EXECUTIVE_SUMMARY_KEY && overview.sections.contains(key))
            .map(|&(key, title)| DetailTab { key, title })
            .collect();

        debug!(
            report_id,
            sections = overview.sections.len(),
            tabs = tabs.len(),
            "built overview view"
        );

        let analysis_date = analysis_date(document);
        let overall_score = summary.overall_score.unwrap_or(0.0);

        Self {
            report_id: report_id.to_string(),
            organization_name: organization_name(document, report_id),
            analysis_date_display: format_display_date(&analysis_date),
            analysis_date,
            overall: ScoreBadge::new(overall_score, ScoreScale::Summary),
            site_score_explanation: summary
                .site_score_explanation
                .as_deref()
                .map_or_else(|| "Not available.".to_string(), |text| non_blank_or(text, "Not available.")),
            total_pages_analyzed: summary
                .total_pages_analyzed
                .filter(|count| *count > 0)
                .unwrap_or(document.page_analyses.len()),
            executive_summary,
            performance_summary: summary
                .performance_summary
                .as_deref()
                .map_or_else(|| "Not available.".to_string(), |text| non_blank_or(text, "Not available.")),
            most_critical_issues: summary.most_critical_issues,
            top_recommendations: summary.top_recommendations,
            key_strengths: summary.key_strengths,
            sections: overview.sections,
            goal_achievement: overview.goal_achievement,
            tabs,
            pages: document.page_analyses.iter().map(page_card).collect(),
        }
    }

    pub fn has_detailed_overview(&self) -> bool {
        !self.tabs.is_empty()
    }
}

fn page_card(page: &PageAnalysis) -> PageCard {
    PageCard {
        id: page.id.clone(),
        title: page.title.clone(),
        url: page.url.clone(),
        score: ScoreBadge::new(page.overall_score, ScoreScale::Summary),
        summary: page.summary.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: PageSection,
    pub badge: ScoreBadge,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionScoreRow {
    pub key: String,
    pub label: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub report_id: String,
    pub organization_name: String,
    pub page_id: String,
    pub display_name: String,
    pub title: String,
    pub url: String,
    pub page_type: String,
    pub overall: ScoreBadge,
    pub overall_explanation: Option<String>,
    pub summary: String,
    pub page_role: String,
    pub page_role_is_fallback: bool,
    pub sections: Vec<SectionView>,
    pub section_scores: Vec<SectionScoreRow>,
    pub key_issues: Vec<PageIssue>,
    pub recommendations: Vec<PageRecommendation>,
    pub screenshot_path: Option<String>,
}

impl PageView {
    pub fn build(
        report_id: &str,
        document: &ReportDocument,
        page_id: &str,
        parsers: &ReportParsers,
    ) -> Result<Self> {
        let Some(page) = document.page_analyses.iter().find(|page| page.id == page_id) else {
            bail!("page {page_id} not found in report {report_id}");
        };

        let organization = organization_name(document, report_id);
        let sections = page_sections(page, parsers)
            .into_iter()
            .map(|section| SectionView {
                badge: ScoreBadge::new(section.score, ScoreScale::Detailed),
                section,
            })
            .collect::<Vec<_>>();

        let extracted_role = page.analysis_text().and_then(extract_page_role);
        let page_role_is_fallback = extracted_role.is_none();
        let page_role = extracted_role.unwrap_or_else(|| {
            fallback_page_role(
                &page.page_type,
                declared_organization(document).unwrap_or("the organization"),
            )
        });

        debug!(
            report_id,
            page_id,
            sections = sections.len(),
            page_role_is_fallback,
            "built page view"
        );

        Ok(Self {
            report_id: report_id.to_string(),
            page_id: page.id.clone(),
            display_name: page_display_name(&page.url, Some(&page.title)),
            title: page.title.clone(),
            url: page.url.clone(),
            page_type: page.page_type.clone(),
            overall: ScoreBadge::new(page.overall_score, ScoreScale::Detailed),
            overall_explanation: page.overall_explanation.clone(),
            summary: page.summary.clone(),
            page_role,
            page_role_is_fallback,
            sections,
            section_scores: page
                .section_scores
                .keys()
                .map(|key| SectionScoreRow {
                    key: key.clone(),
                    label: format_section_name(key),
                    score: page.numeric_section_score(key),
                })
                .collect(),
            key_issues: page.key_issues.clone(),
            recommendations: page.recommendations.clone(),
            screenshot_path: page.screenshot_path.clone(),
            organization_name: organization,
        })
    }
}

/// Upstream `sections[]` when present, otherwise parsed from the raw analysis text.
pub fn page_sections(page: &PageAnalysis, parsers: &ReportParsers) -> Vec<PageSection> {
    if let Some(sections) = page.sections.as_ref().filter(|sections| !sections.is_empty()) {
        return sections.clone();
    }
    page.analysis_text()
        .map(|text| parsers.page_sections.parse(text, &page.section_scores))
        .unwrap_or_default()
}

pub fn organization_name(document: &ReportDocument, report_id: &str) -> String {
    declared_organization(document)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("Report ID: {report_id}"))
}

/// First non-blank organization name the document carries.
fn declared_organization(document: &ReportDocument) -> Option<&str> {
    let metadata_name = document
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.organization_name.as_deref());
    [metadata_name, document.organization.as_deref()]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
}

fn analysis_date(document: &ReportDocument) -> String {
    let generated_at = document
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.generated_at.as_deref());
    [
        generated_at,
        document.timestamp.as_deref(),
        document.analysis_date.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|value| !value.trim().is_empty())
    .map(ToOwned::to_owned)
    .unwrap_or_else(now_utc_string)
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests;
