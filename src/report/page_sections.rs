use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;

use crate::model::{DEFAULT_SECTION_SCORE, PageSection};
use crate::report::tokens::section_name;

/// Upper-cased heading titles that map onto the per-page `section_scores` table.
pub const CANONICAL_SECTIONS: [(&str, &str); 7] = [
    ("FIRST IMPRESSION & CLARITY", "first_impression_clarity"),
    ("GOAL ALIGNMENT", "goal_alignment"),
    ("VISUAL DESIGN", "visual_design"),
    ("CONTENT QUALITY", "content_quality"),
    ("USABILITY & ACCESSIBILITY", "usability_accessibility"),
    ("CONVERSION OPTIMIZATION", "conversion_optimization"),
    ("TECHNICAL EXECUTION", "technical_execution"),
];

pub fn canonical_score_key(title: &str) -> Option<&'static str> {
    let upper = title.trim().to_uppercase();
    CANONICAL_SECTIONS
        .iter()
        .find(|(heading, _)| *heading == upper)
        .map(|(_, key)| *key)
}

#[derive(Debug, Clone, PartialEq)]
enum PageLine<'a> {
    Heading {
        title: String,
        inline_score: Option<f64>,
    },
    Evidence(&'a str),
    Summary(&'a str),
    ScoreExplanation(&'a str),
    Score(f64),
    Bullet(&'a str),
    Blank,
    Text(&'a str),
}

#[derive(Debug)]
pub struct PageSectionParser {
    heading: Regex,
    inline_score: Regex,
    score_line: Regex,
}

impl PageSectionParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"^##\s*(?:\d+\.\s*)?(.+)$")
                .context("failed to compile page section heading regex")?,
            inline_score: Regex::new(r"(?i)\s*\(Score:\s*(\d+(?:\.\d+)?)\s*/\s*10\)")
                .context("failed to compile inline score regex")?,
            // A body `SCORE: N/10` line is the score already set on the section,
            // ranked after the table and inline heading scores.
            score_line: Regex::new(r"(?i)^SCORE:\s*(\d+(?:\.\d+)?)(?:\s*/\s*10)?\s*$")
                .context("failed to compile score line regex")?,
        })
    }

    /// Splits a page's detailed analysis into scored sections in document order.
    ///
    /// Scores come from the `section_scores` table first, then an inline
    /// `(Score: N/10)` on the heading, then a `SCORE:` line in the body, then
    /// [`DEFAULT_SECTION_SCORE`].
    pub fn parse(&self, content: &str, section_scores: &BTreeMap<String, Value>) -> Vec<PageSection> {
        content
            .lines()
            .map(|line| self.classify(line.trim()))
            .fold(PageFold::default(), PageFold::step)
            .finish()
            .into_iter()
            .map(|draft| draft.finalize(section_scores))
            .collect()
    }

    fn classify<'a>(&self, line: &'a str) -> PageLine<'a> {
        if line.is_empty() {
            return PageLine::Blank;
        }

        if !line.starts_with("###") {
            if let Some(captures) = self.heading.captures(line) {
                let raw_title = captures.get(1).map_or("", |value| value.as_str());
                let inline_score = self
                    .inline_score
                    .captures(raw_title)
                    .and_then(|score| score.get(1))
                    .and_then(|score| score.as_str().parse::<f64>().ok());
                let title = self.inline_score.replace_all(raw_title, "").trim().to_string();
                if !title.is_empty() {
                    return PageLine::Heading {
                        title,
                        inline_score,
                    };
                }
            }
        }

        if let Some(rest) = strip_label(line, "EVIDENCE:") {
            return PageLine::Evidence(rest);
        }
        if let Some(rest) = strip_label(line, "SUMMARY:") {
            return PageLine::Summary(rest);
        }
        if let Some(rest) = strip_label(line, "SCORE EXPLANATION:") {
            return PageLine::ScoreExplanation(rest);
        }
        if let Some(score) = self
            .score_line
            .captures(line)
            .and_then(|captures| captures.get(1))
            .and_then(|value| value.as_str().parse::<f64>().ok())
        {
            return PageLine::Score(score);
        }
        if let Some(point) = line.strip_prefix("- ") {
            return PageLine::Bullet(point.trim());
        }
        PageLine::Text(line)
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct SectionDraft {
    title: String,
    inline_score: Option<f64>,
    body_score: Option<f64>,
    summary: Option<String>,
    points: Vec<String>,
    evidence: Vec<String>,
    score_explanation: Option<String>,
    raw_lines: Vec<String>,
}

type ScoreResolver = fn(&SectionDraft, &BTreeMap<String, Value>) -> Option<f64>;

/// Tried in order; the first `Some` wins.
const SCORE_RESOLVERS: [ScoreResolver; 3] = [table_score, inline_heading_score, body_score];

fn table_score(draft: &SectionDraft, section_scores: &BTreeMap<String, Value>) -> Option<f64> {
    canonical_score_key(&draft.title)
        .and_then(|key| section_scores.get(key))
        .and_then(Value::as_f64)
}

fn inline_heading_score(draft: &SectionDraft, _: &BTreeMap<String, Value>) -> Option<f64> {
    draft.inline_score
}

fn body_score(draft: &SectionDraft, _: &BTreeMap<String, Value>) -> Option<f64> {
    draft.body_score
}

impl SectionDraft {
    fn resolve_score(&self, section_scores: &BTreeMap<String, Value>) -> f64 {
        SCORE_RESOLVERS
            .iter()
            .find_map(|resolver| resolver(self, section_scores))
            .unwrap_or(DEFAULT_SECTION_SCORE)
    }

    fn finalize(self, section_scores: &BTreeMap<String, Value>) -> PageSection {
        let score = self.resolve_score(section_scores);
        PageSection {
            name: section_name(&self.title),
            score,
            summary: non_empty(self.summary.unwrap_or_default()),
            points: self.points,
            evidence: non_empty(self.evidence.join("\n")),
            score_explanation: non_empty(self.score_explanation.unwrap_or_default()),
            raw_content: non_empty(self.raw_lines.join("\n")),
            title: self.title,
        }
    }

    /// Routes a non-heading line outside an evidence block; returns true when evidence starts.
    fn absorb(&mut self, line: PageLine<'_>) -> bool {
        match line {
            PageLine::Evidence(text) => {
                self.evidence.push(text.to_string());
                return true;
            }
            PageLine::Summary(text) => self.summary = Some(text.to_string()),
            PageLine::ScoreExplanation(text) => self.score_explanation = Some(text.to_string()),
            PageLine::Score(score) => self.body_score = Some(score),
            PageLine::Bullet(point) => self.points.push(point.to_string()),
            PageLine::Text(text) => self.raw_lines.push(text.to_string()),
            PageLine::Blank | PageLine::Heading { .. } => {}
        }
        false
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Default)]
enum PageCursor {
    #[default]
    NoSection,
    InSection(SectionDraft),
    InEvidence(SectionDraft),
}

#[derive(Debug, Default)]
struct PageFold {
    cursor: PageCursor,
    done: Vec<SectionDraft>,
}

impl PageFold {
    fn step(mut self, line: PageLine<'_>) -> Self {
        let cursor = std::mem::take(&mut self.cursor);

        self.cursor = match (cursor, line) {
            (previous, PageLine::Heading { title, inline_score }) => {
                self.close(previous);
                PageCursor::InSection(SectionDraft {
                    title,
                    inline_score,
                    ..SectionDraft::default()
                })
            }
            (PageCursor::NoSection, _) => PageCursor::NoSection,
            (PageCursor::InSection(mut draft), line) => {
                if draft.absorb(line) {
                    PageCursor::InEvidence(draft)
                } else {
                    PageCursor::InSection(draft)
                }
            }
            (PageCursor::InEvidence(mut draft), line) => match line {
                PageLine::Evidence(text) => {
                    draft.evidence.push(text.to_string());
                    PageCursor::InEvidence(draft)
                }
                PageLine::Bullet(point) => {
                    draft.evidence.push(format!("- {point}"));
                    PageCursor::InEvidence(draft)
                }
                PageLine::Text(text) => {
                    draft.evidence.push(text.to_string());
                    PageCursor::InEvidence(draft)
                }
                PageLine::Blank => {
                    draft.evidence.push(String::new());
                    PageCursor::InEvidence(draft)
                }
                labelled => {
                    draft.absorb(labelled);
                    PageCursor::InSection(draft)
                }
            },
        };
        self
    }

    fn close(&mut self, cursor: PageCursor) {
        match cursor {
            PageCursor::NoSection => {}
            PageCursor::InSection(draft) | PageCursor::InEvidence(draft) => self.done.push(draft),
        }
    }

    fn finish(mut self) -> Vec<SectionDraft> {
        let cursor = std::mem::take(&mut self.cursor);
        self.close(cursor);
        self.done
    }
}
