const PAGE_ROLE_TRIGGERS: [&str; 3] = ["PAGE ROLE ANALYSIS", "PAGE ROLE:", "ROLE OF THIS PAGE:"];

/// Collects the "page role" paragraph from a page's analysis text.
///
/// Capture opens on a trigger line (plain or as a heading), seeded with any
/// text after its first `:`, and closes on the next non-trigger `## ` heading
/// or an `EVIDENCE:` line. Returns `None` when no trigger appears or nothing
/// was captured.
pub fn extract_page_role(content: &str) -> Option<String> {
    let mut fragments: Vec<&str> = Vec::new();
    let mut capturing = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(seed) = trigger_seed(trimmed) {
            capturing = true;
            if !seed.is_empty() {
                fragments.push(seed);
            }
            continue;
        }

        if !capturing {
            continue;
        }

        if trimmed.starts_with("## ") || trimmed.to_uppercase().starts_with("EVIDENCE:") {
            capturing = false;
            continue;
        }

        fragments.push(trimmed);
    }

    let joined = fragments.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

/// Fallback sentence for pages whose analysis has no page-role paragraph.
pub fn fallback_page_role(page_type: &str, organization: &str) -> String {
    let page_type = page_type.trim().to_lowercase();
    let page_type = if page_type.is_empty() {
        "page".to_string()
    } else {
        page_type
    };
    format!(
        "This page serves as a {page_type} for {organization}'s website, contributing to the overall user experience and supporting the organization's digital goals."
    )
}

/// Text after the first `:` when `line` opens a page-role block.
fn trigger_seed(line: &str) -> Option<&str> {
    let candidate = heading_text(line);
    let upper = candidate.to_uppercase();
    if !PAGE_ROLE_TRIGGERS
        .iter()
        .any(|trigger| upper.starts_with(trigger))
    {
        return None;
    }

    Some(
        candidate
            .split_once(':')
            .map_or("", |(_, rest)| rest.trim()),
    )
}

/// Strips `##` markers and a leading `N.` so `## 2. Page Role Analysis` reads as a trigger.
fn heading_text(line: &str) -> &str {
    let Some(rest) = line.strip_prefix("##") else {
        return line;
    };
    let rest = rest.trim_start_matches('#').trim_start();
    let digits = rest.len() - rest.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(after) = rest[digits..].strip_prefix('.') {
            return after.trim_start();
        }
    }
    rest
}
