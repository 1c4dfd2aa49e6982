/// One line of overview markdown, classified by heading level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    Section(&'a str),
    Subsection(&'a str),
    Blank,
    Text(&'a str),
}

impl<'a> LineToken<'a> {
    pub fn classify(line: &'a str) -> Self {
        if let Some(title) = line.strip_prefix("## ") {
            return Self::Section(title.trim());
        }
        if let Some(title) = line.strip_prefix("### ") {
            return Self::Subsection(title.trim());
        }
        if line.trim().is_empty() {
            return Self::Blank;
        }
        Self::Text(line)
    }
}

pub fn tokenize(markdown: &str) -> impl Iterator<Item = LineToken<'_>> {
    markdown.lines().map(LineToken::classify)
}

/// Dash slug used as a section key: `"KEY   FINDINGS"` becomes `key-findings`.
pub fn section_key(title: &str) -> String {
    slug_with(title, '-')
}

/// Underscore slug used as a page-section name: `"Visual Design"` becomes `visual_design`.
pub fn section_name(title: &str) -> String {
    slug_with(title, '_')
}

fn slug_with(title: &str, separator: char) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(separator);
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || separator == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_only_two_heading_levels() {
        assert_eq!(
            LineToken::classify("## Key Findings "),
            LineToken::Section("Key Findings")
        );
        assert_eq!(
            LineToken::classify("### Detail"),
            LineToken::Subsection("Detail")
        );
        assert_eq!(
            LineToken::classify("#### Deeper"),
            LineToken::Text("#### Deeper")
        );
        assert_eq!(LineToken::classify("##NoSpace"), LineToken::Text("##NoSpace"));
        assert_eq!(LineToken::classify("   "), LineToken::Blank);
    }

    #[test]
    fn section_key_normalizes_case_and_whitespace() {
        assert_eq!(section_key("Key Findings"), "key-findings");
        assert_eq!(section_key("key findings"), "key-findings");
        assert_eq!(section_key("KEY   FINDINGS"), "key-findings");
        assert_eq!(
            section_key("Usability & Accessibility"),
            "usability-accessibility"
        );
        assert_eq!(section_key("Roadmap: Phase 2!"), "roadmap-phase-2");
    }

    #[test]
    fn section_key_is_idempotent() {
        for title in ["Executive Summary", "  Strategic -- Recommendations  ", "Über Design"] {
            let once = section_key(title);
            assert_eq!(section_key(&once), once);
        }
    }

    #[test]
    fn section_name_collapses_non_alphanumerics_to_underscores() {
        assert_eq!(section_name("Visual Design"), "visual_design");
        assert_eq!(
            section_name("First Impression & Clarity"),
            "first_impression_clarity"
        );
        assert_eq!(section_name("  Technical Execution."), "technical_execution");
    }
}
