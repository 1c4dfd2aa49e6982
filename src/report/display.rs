use url::Url;

/// `first_impression_clarity` -> `First Impression Clarity`.
pub fn format_section_name(key: &str) -> String {
    key.split('_')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn page_display_name(url: &str, custom_name: Option<&str>) -> String {
    if let Some(name) = custom_name.filter(|name| !name.trim().is_empty()) {
        return name.to_string();
    }

    let Ok(parsed) = Url::parse(url) else {
        return "Page".to_string();
    };
    if parsed.path() == "/" {
        return "Homepage".to_string();
    }

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(|segment| title_case_words(&segment.replace('-', " ")))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Page".to_string())
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case_words(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if at_word_start && ch.is_alphanumeric() {
            output.extend(ch.to_uppercase());
        } else {
            output.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }
    output
}
