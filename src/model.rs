use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_SECTION_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub analysis_date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub overall_summary: Option<OverallSummary>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub page_analyses: Vec<PageAnalysis>,
    #[serde(default)]
    pub metadata: Option<ReportMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallSummary {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub executive_summary: String,
    #[serde(default, deserialize_with = "number_or_none")]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub site_score_explanation: Option<String>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub total_pages_analyzed: Option<usize>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub most_critical_issues: Vec<String>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub top_recommendations: Vec<String>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub key_strengths: Vec<String>,
    #[serde(default)]
    pub performance_summary: Option<String>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub detailed_markdown_content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageAnalysis {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub page_type: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub overall_score: f64,
    #[serde(default, deserialize_with = "map_or_empty")]
    pub section_scores: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub key_issues: Vec<PageIssue>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub recommendations: Vec<PageRecommendation>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub summary: String,
    #[serde(default)]
    pub overall_explanation: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<PageSection>>,
    #[serde(default)]
    pub detailed_analysis: Option<String>,
    #[serde(default)]
    pub raw_analysis: Option<String>,
    #[serde(default)]
    pub screenshot_path: Option<String>,
}

impl PageAnalysis {
    /// Raw analysis text fed to the page parsers, preferring `detailed_analysis`.
    pub fn analysis_text(&self) -> Option<&str> {
        self.detailed_analysis
            .as_deref()
            .filter(|value| !value.is_empty())
            .or_else(|| self.raw_analysis.as_deref().filter(|value| !value.is_empty()))
    }

    pub fn numeric_section_score(&self, key: &str) -> Option<f64> {
        self.section_scores.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageIssue {
    pub issue: String,
    #[serde(default)]
    pub how_to_fix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecommendation {
    pub recommendation: String,
    #[serde(default)]
    pub benefit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSection {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(
        default = "default_section_score",
        deserialize_with = "score_or_default"
    )]
    pub score: f64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub points: Vec<String>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub score_explanation: Option<String>,
    #[serde(default, alias = "rawContent")]
    pub raw_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSubsection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSection {
    pub key: String,
    pub title: String,
    pub content: String,
    pub subsections: Vec<ParsedSubsection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub report_id: String,
    pub relative_path: String,
    pub sha256: String,
    pub byte_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub report_count: usize,
    pub reports: Vec<ReportEntry>,
}

fn default_section_score() -> f64 {
    DEFAULT_SECTION_SCORE
}

fn score_or_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(DEFAULT_SECTION_SCORE))
}

fn number_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

fn count_or_none<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().map(|count| count as usize))
}

/// Accepts anything; non-arrays become empty and elements that do not parse are dropped.
fn array_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(
                    index,
                    element = std::any::type_name::<T>(),
                    error = %err,
                    "dropping malformed report entry"
                );
                None
            }
        })
        .collect();

    if parsed.len() < total {
        debug!(kept = parsed.len(), total, "kept parseable report entries");
    }
    Ok(parsed)
}

/// Null or non-string values read as an empty string.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        _ => String::new(),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {other}"
        ))),
    }
}

fn map_or_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(entries) => entries.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_section_score_coerces_missing_and_non_numeric_values() {
        let raw = r#"[
            {"name": "a", "title": "A"},
            {"name": "b", "title": "B", "score": "high"},
            {"name": "c", "title": "C", "score": 7}
        ]"#;

        let sections: Vec<PageSection> =
            serde_json::from_str(raw).expect("sections should deserialize");
        assert_eq!(sections[0].score, 5.0);
        assert_eq!(sections[1].score, 5.0);
        assert_eq!(sections[2].score, 7.0);
    }

    #[test]
    fn report_document_tolerates_missing_and_malformed_fields() {
        let raw = r#"{
            "organization": "Acme",
            "page_analyses": "not-an-array",
            "overall_summary": {"overall_score": "n/a", "most_critical_issues": null}
        }"#;

        let document: ReportDocument =
            serde_json::from_str(raw).expect("document should deserialize");
        assert!(document.page_analyses.is_empty());
        let summary = document.overall_summary.expect("summary present");
        assert!(summary.overall_score.is_none());
        assert!(summary.most_critical_issues.is_empty());
        assert!(summary.detailed_markdown_content.is_empty());
    }

    #[test]
    fn malformed_page_is_dropped_without_losing_its_neighbours() {
        let raw = r#"{
            "page_analyses": [
                {"id": "p1", "summary": "ok"},
                {"id": "p2", "summary": null},
                {"id": 3, "title": "Numeric id"},
                {"title": "No id"}
            ],
            "overall_summary": {
                "most_critical_issues": ["Slow checkout", 7, "Tiny fonts"]
            }
        }"#;

        let document: ReportDocument =
            serde_json::from_str(raw).expect("document should deserialize");
        let ids: Vec<&str> = document
            .page_analyses
            .iter()
            .map(|page| page.id.as_str())
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "3"]);
        assert_eq!(document.page_analyses[1].summary, "");
        let summary = document.overall_summary.expect("summary present");
        assert_eq!(summary.most_critical_issues, vec!["Slow checkout", "Tiny fonts"]);
    }

    #[test]
    fn null_text_fields_read_as_empty() {
        let raw = r#"{
            "overall_summary": {
                "executive_summary": null,
                "detailed_markdown_content": null,
                "overall_score": 7
            },
            "page_analyses": [{
                "id": "home",
                "url": null,
                "title": null,
                "page_type": null,
                "section_scores": null,
                "key_issues": [{"issue": "Hidden fees"}, {"how_to_fix": "orphan"}]
            }]
        }"#;

        let document: ReportDocument =
            serde_json::from_str(raw).expect("document should deserialize");
        let summary = document.overall_summary.expect("summary present");
        assert!(summary.executive_summary.is_empty());
        assert!(summary.detailed_markdown_content.is_empty());
        assert_eq!(summary.overall_score, Some(7.0));
        let page = &document.page_analyses[0];
        assert!(page.url.is_empty() && page.title.is_empty() && page.page_type.is_empty());
        assert!(page.section_scores.is_empty());
        assert_eq!(page.key_issues.len(), 1);
    }

    #[test]
    fn analysis_text_prefers_detailed_analysis_over_raw() {
        let mut page = PageAnalysis {
            id: "p1".to_string(),
            raw_analysis: Some("raw".to_string()),
            ..PageAnalysis::default()
        };
        assert_eq!(page.analysis_text(), Some("raw"));

        page.detailed_analysis = Some("detailed".to_string());
        assert_eq!(page.analysis_text(), Some("detailed"));
    }
}
