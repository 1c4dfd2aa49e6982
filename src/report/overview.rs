use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::model::{ParsedSection, ParsedSubsection};
use crate::report::tokens::{LineToken, section_key, tokenize};

pub const EXECUTIVE_SUMMARY_KEY: &str = "executive-summary";
pub const KEY_FINDINGS_KEY: &str = "key-findings";

const GOAL_ACHIEVEMENT: &str = "goal achievement assessment";
const DROPPED_SUMMARY_SUBSECTIONS: [&str; 2] = ["key strengths", "critical weaknesses"];
const GOAL_BLOCK_TERMINATORS: [&str; 3] = ["##", "**performance summary", "**key strengths"];
const INLINE_GOAL_TERMINATORS: [&str; 2] = ["#", "**"];

/// Sections of the overall-summary markdown in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionTree {
    sections: Vec<ParsedSection>,
}

impl SectionTree {
    pub fn get(&self, key: &str) -> Option<&ParsedSection> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedSection> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn upsert(&mut self, section: ParsedSection) {
        match self
            .sections
            .iter_mut()
            .find(|existing| existing.key == section.key)
        {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedOverview {
    pub sections: SectionTree,
    pub goal_achievement: String,
}

#[derive(Debug)]
pub struct OverviewParser {
    goal_heading: Regex,
    key_findings_heading: Regex,
    inline_goal_label: Regex,
    summary_goal_label: Regex,
    summary_goal_heading: Regex,
    paragraph_gap: Regex,
}

impl OverviewParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            goal_heading: Regex::new(r"(?i)###?[ \t]*Goal Achievement Assessment[:\s]*\n")
                .context("failed to compile goal heading regex")?,
            key_findings_heading: Regex::new(r"(?i)## KEY FINDINGS")
                .context("failed to compile key findings heading regex")?,
            inline_goal_label: Regex::new(r"(?i)\**Goal Achievement Assessment[:*\s]*\n")
                .context("failed to compile inline goal label regex")?,
            summary_goal_label: Regex::new(r"(?i)(?:\n\n)?\*\*Goal Achievement Assessment:\*\*")
                .context("failed to compile summary goal label regex")?,
            summary_goal_heading: Regex::new(r"(?i)(?:\n\n)?###?\s*Goal Achievement Assessment")
                .context("failed to compile summary goal heading regex")?,
            paragraph_gap: Regex::new(r"\n\s*\n")
                .context("failed to compile paragraph gap regex")?,
        })
    }

    pub fn parse(&self, markdown: &str, main_executive_summary: &str) -> ParsedOverview {
        ParsedOverview {
            sections: self.parse_sections(markdown, main_executive_summary),
            goal_achievement: self.extract_goal_achievement(markdown),
        }
    }

    pub fn parse_sections(&self, markdown: &str, main_executive_summary: &str) -> SectionTree {
        let drafts = tokenize(markdown)
            .fold(TreeFold::default(), TreeFold::step)
            .finish();

        let mut tree = SectionTree::default();
        for draft in drafts {
            let content = match draft.key.as_str() {
                EXECUTIVE_SUMMARY_KEY => {
                    self.clean_executive_summary(&draft.content, main_executive_summary)
                }
                KEY_FINDINGS_KEY => self.strip_inline_goal(&draft.content),
                _ => draft.content,
            };
            tree.upsert(ParsedSection {
                key: draft.key,
                title: draft.title,
                content,
                subsections: draft.subsections,
            });
        }
        tree
    }

    /// Goal-achievement text from a `### Goal Achievement Assessment` block,
    /// falling back to an inline label inside `## KEY FINDINGS`.
    pub fn extract_goal_achievement(&self, markdown: &str) -> String {
        if markdown.is_empty() {
            return String::new();
        }

        if let Some(found) = self.goal_heading.find(markdown) {
            let body = &markdown[found.end()..];
            let end = block_end(body, &GOAL_BLOCK_TERMINATORS);
            let text = body[..end].trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }

        let Some(heading) = self.key_findings_heading.find(markdown) else {
            return String::new();
        };
        let rest = &markdown[heading.end()..];
        let block = &rest[..rest.find("\n\n## ").unwrap_or(rest.len())];

        let Some(label) = self.inline_goal_label.find(block) else {
            return String::new();
        };
        let body = &block[label.end()..];
        let end = block_end(body, &INLINE_GOAL_TERMINATORS);
        body[..end].trim().to_string()
    }

    fn clean_executive_summary(&self, content: &str, main_executive_summary: &str) -> String {
        let mut cleaned = content.to_string();

        for line in main_executive_summary.lines() {
            let words: Vec<String> = line.split_whitespace().map(regex::escape).collect();
            if words.is_empty() {
                continue;
            }
            let pattern = format!(r"(?i)(^|\n){}(\n|$)", words.join(r"\s*"));
            let Ok(line_regex) = Regex::new(&pattern) else {
                continue;
            };
            cleaned = line_regex
                .replace_all(&cleaned, |caps: &Captures<'_>| {
                    let before = caps.get(1).map_or("", |value| value.as_str());
                    let after = caps.get(2).map_or("", |value| value.as_str());
                    if !before.is_empty() && !after.is_empty() {
                        before.to_string()
                    } else {
                        String::new()
                    }
                })
                .into_owned();
        }

        let cleaned = self.paragraph_gap.replace_all(&cleaned, "\n\n");
        let cleaned = strip_until_section(cleaned.trim(), &self.summary_goal_label);
        strip_until_section(&cleaned, &self.summary_goal_heading)
    }

    fn strip_inline_goal(&self, content: &str) -> String {
        let Some(label) = self.inline_goal_label.find(content) else {
            return content.to_string();
        };
        let body = &content[label.end()..];
        let end = label.end() + block_end(body, &INLINE_GOAL_TERMINATORS);

        let mut stripped = String::with_capacity(content.len());
        stripped.push_str(content[..label.start()].trim_end());
        let tail = content[end..].trim_start();
        if !stripped.is_empty() && !tail.is_empty() {
            stripped.push_str("\n\n");
        }
        stripped.push_str(tail);
        stripped.trim().to_string()
    }
}

/// Offset of the first line break followed by a line starting with one of
/// `terminators` (matched case-insensitively) or by only whitespace, else the
/// end of `body`.
fn block_end(body: &str, terminators: &[&str]) -> usize {
    body.match_indices('\n')
        .map(|(offset, _)| offset)
        .find(|offset| {
            let after = &body[offset + 1..];
            after.trim().is_empty()
                || terminators
                    .iter()
                    .any(|prefix| starts_with_ignore_case(after, prefix))
        })
        .unwrap_or(body.len())
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn strip_until_section(content: &str, start: &Regex) -> String {
    let Some(found) = start.find(content) else {
        return content.to_string();
    };
    let end = content[found.start()..]
        .find("\n\n##")
        .map_or(content.len(), |offset| found.start() + offset);

    let mut stripped = content[..found.start()].to_string();
    stripped.push_str(&content[end..]);
    stripped.trim().to_string()
}

#[derive(Debug)]
struct SectionDraft {
    key: String,
    title: String,
    content: String,
    subsections: Vec<ParsedSubsection>,
}

#[derive(Debug)]
enum Cursor {
    NoSection,
    InSection,
    InSubsection { title: String, keep: bool },
    InGoalBlock,
}

#[derive(Debug)]
struct OpenSection {
    key: String,
    title: String,
    body: Vec<String>,
    subsections: Vec<ParsedSubsection>,
    sub_body: Vec<String>,
}

/// Accumulator threaded through the line fold; each step consumes and returns it.
#[derive(Debug)]
struct TreeFold {
    cursor: Cursor,
    open: Option<OpenSection>,
    done: Vec<SectionDraft>,
}

impl Default for TreeFold {
    fn default() -> Self {
        Self {
            cursor: Cursor::NoSection,
            open: None,
            done: Vec::new(),
        }
    }
}

impl TreeFold {
    fn step(self, token: LineToken<'_>) -> Self {
        match token {
            LineToken::Section(title) => self.open_section(title),
            LineToken::Subsection(title) => self.open_subsection(title),
            LineToken::Blank => self.push_line(""),
            LineToken::Text(line) => self.push_line(line),
        }
    }

    fn finish(self) -> Vec<SectionDraft> {
        self.commit_section().done
    }

    fn open_section(self, title: &str) -> Self {
        let mut next = self.commit_section();
        let key = section_key(title);
        if key.is_empty() {
            next.cursor = Cursor::NoSection;
            return next;
        }
        next.open = Some(OpenSection {
            key,
            title: title.to_string(),
            body: Vec::new(),
            subsections: Vec::new(),
            sub_body: Vec::new(),
        });
        next.cursor = Cursor::InSection;
        next
    }

    fn open_subsection(self, title: &str) -> Self {
        let mut next = self.commit_subsection();
        let Some(open) = next.open.as_ref() else {
            return next;
        };

        let lowered = title.to_lowercase();
        next.cursor = if open.key == KEY_FINDINGS_KEY && lowered.contains(GOAL_ACHIEVEMENT) {
            Cursor::InGoalBlock
        } else {
            let dropped = open.key == EXECUTIVE_SUMMARY_KEY
                && DROPPED_SUMMARY_SUBSECTIONS
                    .iter()
                    .any(|name| lowered.contains(name));
            Cursor::InSubsection {
                title: title.to_string(),
                keep: !dropped,
            }
        };
        next
    }

    fn push_line(mut self, line: &str) -> Self {
        let Some(open) = self.open.as_mut() else {
            return self;
        };

        match self.cursor {
            Cursor::NoSection => {}
            Cursor::InSection => open.body.push(line.trim_end().to_string()),
            Cursor::InSubsection { .. } => open.sub_body.push(line.trim_end().to_string()),
            Cursor::InGoalBlock => {
                if resumes_section_body(line) {
                    open.body.push(line.trim_end().to_string());
                    self.cursor = Cursor::InSection;
                }
            }
        }
        self
    }

    fn commit_subsection(mut self) -> Self {
        let cursor = std::mem::replace(&mut self.cursor, Cursor::NoSection);
        let Some(open) = self.open.as_mut() else {
            return self;
        };

        if let Cursor::InSubsection { title, keep: true } = cursor {
            open.subsections.push(ParsedSubsection {
                title,
                content: join_block(&open.sub_body),
            });
        }
        open.sub_body.clear();
        self.cursor = Cursor::InSection;
        self
    }

    fn commit_section(self) -> Self {
        let mut next = self.commit_subsection();
        if let Some(open) = next.open.take() {
            next.done.push(SectionDraft {
                content: join_block(&open.body),
                key: open.key,
                title: open.title,
                subsections: open.subsections,
            });
        }
        next.cursor = Cursor::NoSection;
        next
    }
}

fn resumes_section_body(line: &str) -> bool {
    let trimmed = line.trim_start();
    GOAL_BLOCK_TERMINATORS[1..]
        .iter()
        .any(|prefix| starts_with_ignore_case(trimmed, prefix))
}

/// Joins buffered lines, collapsing runs of blank lines into one paragraph break.
fn join_block(lines: &[String]) -> String {
    let mut joined = String::new();
    let mut pending_gap = false;

    for line in lines {
        if line.trim().is_empty() {
            pending_gap = !joined.is_empty();
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(if pending_gap { "\n\n" } else { "\n" });
        }
        pending_gap = false;
        joined.push_str(line);
    }

    joined.trim().to_string()
}
